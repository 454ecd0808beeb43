//! Data models
//!
//! Transient representations of CMS documents. Nothing here is persisted by
//! this server: every value is fetched from the CMS and written back to it
//! within a single request.

mod course;
mod envelope;
mod lesson;
mod tag;
mod user;

pub use course::{Course, CourseInput, Media};
pub use envelope::{Collection, Envelope, Meta, Pagination};
pub use lesson::{Lesson, LessonDraft, LessonInput};
pub use tag::Tag;
pub use user::{AuthGrant, AuthorRef, ProfileUpdate, User};
