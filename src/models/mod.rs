pub mod image;
pub mod user;

pub use image::Image;
pub use user::{AuthResponse, CreateUserRequest, LoginRequest, PlanTier, UsageResponse, User, UserResponse};
