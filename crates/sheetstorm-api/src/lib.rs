mod dto;
mod errors;

pub use dto::{
    AutoGenerateRequest, AutoGenerateResponse, CreateEdgeRequest, CreateNodeRequest,
    EdgeRecord, EdgeTypesResponse, GraphSnapshot, NodeRecord, NodeTypesResponse, TimelinePage,
    UpdateEdgeRequest, UpdateNodeRequest,
};
pub use errors::{ApiError, ErrorBody};
