use validator::Validate;

/// Registration candidate as submitted by the user.
#[derive(Debug, Clone, Validate)]
pub struct CreateAccountDto {
    #[validate(length(min = 1, max = 50, message = "username must be 1–50 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}
