use chrono::{Duration, Utc};

use onboard::domain::types::OtpSettings;
use onboard::error::OnboardServiceError;
use onboard::usecase::otp::{RequestOtpInput, RequestOtpUseCase};

use crate::helpers::{MockChallengeRepo, MockDelivery, PHONE, PlainHasher, plain_hash, test_challenge};

fn usecase(
    challenges: MockChallengeRepo,
    delivery: MockDelivery,
) -> RequestOtpUseCase<MockChallengeRepo, MockDelivery, PlainHasher> {
    RequestOtpUseCase {
        challenges,
        delivery,
        hasher: PlainHasher,
        settings: OtpSettings::default(),
        default_country_code: "91".to_owned(),
    }
}

fn input(phone: &str) -> RequestOtpInput {
    RequestOtpInput {
        name: "  Asha Rao ".to_owned(),
        phone: phone.to_owned(),
        email: "Asha@Example.com".to_owned(),
    }
}

#[tokio::test]
async fn should_issue_challenge_and_deliver_code() {
    let repo = MockChallengeRepo::empty();
    let challenges = repo.handle();
    let delivery = MockDelivery::ok();
    let sent = delivery.handle();

    let output = usecase(repo, delivery)
        .execute(input(PHONE))
        .await
        .unwrap();
    assert_eq!(output.expires_in_minutes, 5);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "expected exactly one delivery");
    let (to, otp) = &sent[0];
    assert_eq!(to, PHONE);
    assert_eq!(otp.len(), 6);
    assert!(otp.bytes().all(|b| b.is_ascii_digit()));

    let challenges = challenges.lock().unwrap();
    assert_eq!(challenges.len(), 1);
    let stored = &challenges[0];
    assert_eq!(stored.id, output.challenge_id.0);
    assert_eq!(stored.phone, PHONE);
    assert_eq!(stored.name, "Asha Rao");
    assert_eq!(stored.email, "asha@example.com");
    assert_eq!(stored.secret_hash, plain_hash(otp));
    assert_ne!(stored.secret_hash, *otp, "plaintext must never be stored");
    assert!(!stored.is_used);
    assert_eq!(stored.attempts, 0);
    assert_eq!(stored.expires_at - stored.created_at, Duration::minutes(5));
}

#[tokio::test]
async fn should_normalize_national_number_with_default_country_code() {
    let repo = MockChallengeRepo::empty();
    let challenges = repo.handle();

    usecase(repo, MockDelivery::ok())
        .execute(input("98765 43210"))
        .await
        .unwrap();

    assert_eq!(challenges.lock().unwrap()[0].phone, PHONE);
}

#[tokio::test]
async fn should_rate_limit_second_request_within_cooldown() {
    let repo = MockChallengeRepo::empty();
    let challenges = repo.handle();
    let uc = usecase(repo, MockDelivery::ok());

    uc.execute(input(PHONE)).await.unwrap();
    let result = uc.execute(input(PHONE)).await;

    assert!(
        matches!(result, Err(OnboardServiceError::RateLimited)),
        "expected RateLimited, got {result:?}"
    );
    assert_eq!(challenges.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_allow_new_request_after_cooldown() {
    let mut earlier = test_challenge("111111");
    earlier.created_at = Utc::now() - Duration::seconds(61);
    let repo = MockChallengeRepo::new(vec![earlier.clone()]);
    let challenges = repo.handle();

    usecase(repo, MockDelivery::ok())
        .execute(input(PHONE))
        .await
        .unwrap();

    let challenges = challenges.lock().unwrap();
    assert_eq!(challenges.len(), 2);
    // Earlier challenge is left as it was.
    assert!(challenges.iter().any(|c| c.id == earlier.id && !c.is_used));
}

#[tokio::test]
async fn should_not_share_cooldown_across_phones() {
    let repo = MockChallengeRepo::new(vec![test_challenge("111111")]);
    let challenges = repo.handle();

    usecase(repo, MockDelivery::ok())
        .execute(input("+14155550123"))
        .await
        .unwrap();

    assert_eq!(challenges.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_roll_back_challenge_when_delivery_fails() {
    let repo = MockChallengeRepo::empty();
    let challenges = repo.handle();

    let result = usecase(repo, MockDelivery::failing())
        .execute(input(PHONE))
        .await;

    assert!(
        matches!(result, Err(OnboardServiceError::DeliveryFailed)),
        "expected DeliveryFailed, got {result:?}"
    );
    assert!(
        challenges.lock().unwrap().is_empty(),
        "undelivered challenge must be deleted"
    );
}

#[tokio::test]
async fn should_reject_invalid_input_without_touching_store() {
    let cases = [
        RequestOtpInput {
            name: "   ".to_owned(),
            phone: PHONE.to_owned(),
            email: "asha@example.com".to_owned(),
        },
        RequestOtpInput {
            name: "Asha Rao".to_owned(),
            phone: "abc".to_owned(),
            email: "asha@example.com".to_owned(),
        },
        RequestOtpInput {
            name: "Asha Rao".to_owned(),
            phone: "+0123".to_owned(),
            email: "asha@example.com".to_owned(),
        },
        RequestOtpInput {
            name: "Asha Rao".to_owned(),
            phone: PHONE.to_owned(),
            email: "asha.example.com".to_owned(),
        },
        RequestOtpInput {
            name: "x".repeat(101),
            phone: PHONE.to_owned(),
            email: "asha@example.com".to_owned(),
        },
    ];

    for case in cases {
        let repo = MockChallengeRepo::empty();
        let challenges = repo.handle();
        let delivery = MockDelivery::ok();
        let sent = delivery.handle();

        let result = usecase(repo, delivery).execute(case).await;

        assert!(
            matches!(result, Err(OnboardServiceError::Validation(_))),
            "expected Validation, got {result:?}"
        );
        assert!(challenges.lock().unwrap().is_empty());
        assert!(sent.lock().unwrap().is_empty());
    }
}
