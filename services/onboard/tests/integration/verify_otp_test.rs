use chrono::{Duration, Utc};

use onboard::error::OnboardServiceError;
use onboard::usecase::otp::{VerifyOtpInput, VerifyOtpUseCase};

use crate::helpers::{
    MockChallengeRepo, MockUserRepo, PHONE, PlainHasher, RecordingScheduler, test_challenge,
    test_user,
};

type Verify = VerifyOtpUseCase<MockChallengeRepo, MockUserRepo, PlainHasher, RecordingScheduler>;

fn usecase(challenges: MockChallengeRepo, users: MockUserRepo, crm_sync: RecordingScheduler) -> Verify {
    VerifyOtpUseCase {
        challenges,
        users,
        hasher: PlainHasher,
        crm_sync,
        default_country_code: "91".to_owned(),
    }
}

fn input(challenge_id: impl ToString, otp: &str, phone: &str) -> VerifyOtpInput {
    VerifyOtpInput {
        challenge_id: challenge_id.to_string(),
        otp: otp.to_owned(),
        phone: phone.to_owned(),
    }
}

#[tokio::test]
async fn should_count_wrong_code_then_create_user_on_correct_code() {
    let challenge = test_challenge("483920");
    let repo = MockChallengeRepo::new(vec![challenge.clone()]);
    let challenges = repo.handle();
    let users = MockUserRepo::empty();
    let stored_users = users.handle();
    let scheduler = RecordingScheduler::new();
    let scheduled = scheduler.handle();
    let uc = usecase(repo, users, scheduler);

    let wrong = uc.execute(input(challenge.id, "000000", PHONE)).await;
    assert!(
        matches!(
            wrong,
            Err(OnboardServiceError::InvalidOtp {
                attempts_remaining: 4
            })
        ),
        "expected InvalidOtp with 4 remaining, got {wrong:?}"
    );

    let output = uc
        .execute(input(challenge.id, "483920", PHONE))
        .await
        .unwrap();
    assert_eq!(output.user.name, "Asha Rao");
    assert_eq!(output.user.email, "asha@example.com");
    assert_eq!(output.user.phone, PHONE);
    assert!(output.user.is_verified);
    assert!(!output.user.crm_synced);
    assert!(output.user.last_login.is_some());

    let stored = &challenges.lock().unwrap()[0];
    assert!(stored.is_used);
    assert_eq!(stored.attempts, 2);

    assert_eq!(stored_users.lock().unwrap().len(), 1);
    let scheduled = scheduled.lock().unwrap();
    assert_eq!(scheduled.len(), 1, "new user must be queued for crm sync");
    assert_eq!(scheduled[0].id, output.user.id);
}

#[tokio::test]
async fn should_reject_reuse_of_consumed_challenge() {
    let challenge = test_challenge("483920");
    let uc = usecase(
        MockChallengeRepo::new(vec![challenge.clone()]),
        MockUserRepo::empty(),
        RecordingScheduler::new(),
    );

    uc.execute(input(challenge.id, "483920", PHONE))
        .await
        .unwrap();
    let result = uc.execute(input(challenge.id, "483920", PHONE)).await;

    assert!(
        matches!(result, Err(OnboardServiceError::AlreadyUsed)),
        "expected AlreadyUsed, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_every_attempt_after_fifth_even_with_correct_code() {
    let challenge = test_challenge("483920");
    let repo = MockChallengeRepo::new(vec![challenge.clone()]);
    let challenges = repo.handle();
    let users = MockUserRepo::empty();
    let stored_users = users.handle();
    let uc = usecase(repo, users, RecordingScheduler::new());

    for expected_remaining in [4u32, 3, 2, 1, 0] {
        let result = uc.execute(input(challenge.id, "000000", PHONE)).await;
        assert!(
            matches!(
                result,
                Err(OnboardServiceError::InvalidOtp { attempts_remaining }) if attempts_remaining == expected_remaining
            ),
            "expected {expected_remaining} remaining, got {result:?}"
        );
    }

    for call in [6, 7] {
        let result = uc.execute(input(challenge.id, "483920", PHONE)).await;
        assert!(
            matches!(result, Err(OnboardServiceError::TooManyAttempts)),
            "call {call}: expected TooManyAttempts, got {result:?}"
        );
    }
    assert!(!challenges.lock().unwrap()[0].is_used);
    assert!(stored_users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_expired_challenge_without_counting_attempt() {
    let mut challenge = test_challenge("483920");
    challenge.created_at = Utc::now() - Duration::minutes(6);
    challenge.expires_at = Utc::now() - Duration::seconds(1);
    let repo = MockChallengeRepo::new(vec![challenge.clone()]);
    let challenges = repo.handle();
    let uc = usecase(repo, MockUserRepo::empty(), RecordingScheduler::new());

    let result = uc.execute(input(challenge.id, "483920", PHONE)).await;

    assert!(
        matches!(result, Err(OnboardServiceError::Expired)),
        "expected Expired, got {result:?}"
    );
    assert_eq!(challenges.lock().unwrap()[0].attempts, 0);
}

#[tokio::test]
async fn should_return_not_found_on_phone_mismatch_or_unknown_id() {
    let challenge = test_challenge("483920");
    let uc = usecase(
        MockChallengeRepo::new(vec![challenge.clone()]),
        MockUserRepo::empty(),
        RecordingScheduler::new(),
    );

    let cases = [
        input(challenge.id, "483920", "+14155550123"),
        input(uuid::Uuid::new_v4(), "483920", PHONE),
        input("not-a-uuid", "483920", PHONE),
    ];
    for case in cases {
        let result = uc.execute(case).await;
        assert!(
            matches!(result, Err(OnboardServiceError::ChallengeNotFound)),
            "expected ChallengeNotFound, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_accept_phone_in_national_format() {
    let challenge = test_challenge("483920");
    let uc = usecase(
        MockChallengeRepo::new(vec![challenge.clone()]),
        MockUserRepo::empty(),
        RecordingScheduler::new(),
    );

    let output = uc
        .execute(input(challenge.id, "483920", "98765-43210"))
        .await
        .unwrap();
    assert_eq!(output.user.phone, PHONE);
}

#[tokio::test]
async fn should_require_all_fields() {
    let uc = usecase(
        MockChallengeRepo::empty(),
        MockUserRepo::empty(),
        RecordingScheduler::new(),
    );

    let result = uc.execute(input(uuid::Uuid::new_v4(), "  ", PHONE)).await;
    assert!(
        matches!(result, Err(OnboardServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

#[tokio::test]
async fn should_update_existing_user_and_skip_crm_when_already_synced() {
    let mut existing = test_user();
    existing.name = "Old Name".to_owned();
    existing.email = "old@example.com".to_owned();
    existing.crm_synced = true;
    existing.crm_id = Some("5725767000000524157".to_owned());
    existing.last_login = None;

    let challenge = test_challenge("483920");
    let users = MockUserRepo::new(vec![existing.clone()]);
    let stored_users = users.handle();
    let scheduler = RecordingScheduler::new();
    let scheduled = scheduler.handle();
    let uc = usecase(MockChallengeRepo::new(vec![challenge.clone()]), users, scheduler);

    let output = uc
        .execute(input(challenge.id, "483920", PHONE))
        .await
        .unwrap();

    assert_eq!(output.user.id, existing.id);
    assert_eq!(output.user.name, "Asha Rao");
    assert_eq!(output.user.email, "asha@example.com");
    assert!(output.user.crm_synced);
    assert_eq!(output.user.crm_id, existing.crm_id);
    assert!(output.user.last_login.is_some());
    assert_eq!(stored_users.lock().unwrap().len(), 1);
    assert!(
        scheduled.lock().unwrap().is_empty(),
        "synced users must not be re-sent to the crm"
    );
}

#[tokio::test]
async fn should_resync_existing_user_that_never_reached_crm() {
    let existing = test_user();
    let challenge = test_challenge("483920");
    let scheduler = RecordingScheduler::new();
    let scheduled = scheduler.handle();
    let uc = usecase(
        MockChallengeRepo::new(vec![challenge.clone()]),
        MockUserRepo::new(vec![existing.clone()]),
        scheduler,
    );

    uc.execute(input(challenge.id, "483920", PHONE))
        .await
        .unwrap();

    assert_eq!(scheduled.lock().unwrap()[0].id, existing.id);
}

#[tokio::test]
async fn should_reject_expired_challenge_regardless_of_attempt_count() {
    for prior_attempts in [3, 5] {
        let mut challenge = test_challenge("483920");
        challenge.attempts = prior_attempts;
        challenge.created_at = Utc::now() - Duration::minutes(6);
        challenge.expires_at = Utc::now() - Duration::seconds(1);
        let repo = MockChallengeRepo::new(vec![challenge.clone()]);
        let challenges = repo.handle();
        let uc = usecase(repo, MockUserRepo::empty(), RecordingScheduler::new());

        let result = uc.execute(input(challenge.id, "483920", PHONE)).await;

        assert!(
            matches!(result, Err(OnboardServiceError::Expired)),
            "{prior_attempts} prior attempts: expected Expired, got {result:?}"
        );
        assert_eq!(challenges.lock().unwrap()[0].attempts, prior_attempts);
    }
}
