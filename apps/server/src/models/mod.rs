//! Domain models shared by the service, store and API layers.

pub mod association;
pub mod business;
pub mod context;
pub mod schema;
pub mod search;

pub use association::AssociationRef;
pub use business::{
    parse_biz_id, Business, DataStatus, InternalModule, InternalModuleSet, NewBusiness,
    DEFAULT_APP_FLAG, ORDINARY_APP_FLAG,
};
pub use context::RequestContext;
pub use schema::{AttributeDefinition, ObjectSchema};
pub use search::{BusinessQuery, Page, SearchRequest, SearchResult, SortSpec};

/// Object id of the built-in business ("application") object type.
pub const BIZ_OBJ_ID: &str = "biz";

/// Wire names of the fields the topology layer reasons about.
pub mod field {
    pub const BIZ_ID: &str = "bk_biz_id";
    pub const BIZ_NAME: &str = "bk_biz_name";
    pub const OWNER_ID: &str = "bk_supplier_account";
    pub const DEFAULT: &str = "default";
    pub const DATA_STATUS: &str = "bk_data_status";
    pub const CREATE_TIME: &str = "create_time";
    pub const LAST_TIME: &str = "last_time";

    pub const OBJ_ID: &str = "bk_obj_id";
    pub const INST_ID: &str = "bk_inst_id";
    pub const ASST_OBJ_ID: &str = "bk_asst_obj_id";
    pub const ASST_INST_ID: &str = "bk_asst_inst_id";

    /// Fields owned by the server. Never taken from caller attributes.
    pub const RESERVED: &[&str] = &[BIZ_ID, OWNER_ID, DEFAULT, CREATE_TIME, LAST_TIME];

    /// Scoping fields the default-business lookup always decides itself.
    pub const DEFAULT_SCOPE: &[&str] = &[DATA_STATUS, DEFAULT, OWNER_ID];
}
