//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the CMS client. They are
//! responsible for:
//! - Validation and error classification
//! - Ownership checks and payload reshaping
//! - Filling derived fields (`videoUrl`, `proxyUrl`) on responses

pub mod course;
pub mod lesson;
pub mod media;
pub mod session;
pub mod tag;

pub use course::{CourseService, CourseServiceError, NewCourse, UpdateCourseRequest};
pub use lesson::{embed_video_url, extract_video_url, strip_video_markers, LessonAction};
pub use media::{MediaError, MediaRelay};
pub use session::{SessionError, SessionService};
pub use tag::{resolve_tag_ids, TagService};
