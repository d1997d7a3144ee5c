pub mod count_cache;
pub mod follow_graph;
pub mod session;

pub use count_cache::CountCache;
pub use follow_graph::FollowGraphService;
pub use session::UserSession;
