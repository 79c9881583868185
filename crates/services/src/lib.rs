#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod event_loop;
pub mod notify;
pub mod progress_service;
pub mod session;

pub use guide_core::Clock;

pub use app_services::GuideServices;
pub use error::GuideError;
pub use event_loop::{GuideHandle, spawn};
pub use notify::{ChannelAdapter, Notification, NullAdapter, PresentationAdapter};
pub use progress_service::ProgressService;
pub use session::GuideSession;
