use onboard_domain::id::UserId;

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::OnboardServiceError;

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, UserId(id): UserId) -> Result<User, OnboardServiceError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(OnboardServiceError::UserNotFound)
    }
}
