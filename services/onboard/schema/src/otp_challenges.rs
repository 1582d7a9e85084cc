use sea_orm::entity::prelude::*;

/// Outstanding OTP challenge sent over WhatsApp.
/// `secret_hash` is a one-way hash; the plaintext code is never stored.
/// Rows past `expires_at` are swept by the service; expiry is still checked on every read.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_challenges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub phone: String,
    /// Pending profile data, copied onto the user on successful verification.
    pub name: String,
    pub email: String,
    pub secret_hash: String,
    pub is_used: bool,
    pub attempts: i32,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
