pub mod short_link;
pub mod visit_log;

pub use short_link::Entity as ShortLinkEntity;
pub use visit_log::Entity as VisitLogEntity;
