use chrono::Duration;
use std::collections::BTreeSet;

use quiz_core::model::{QuestionId, QuizSettingsDraft};
use quiz_core::time::fixed_now;
use quiz_services::{AppServices, Clock, QuizLoopService, QuizSession};
use quiz_storage::repository::{CardStateRepository, Storage};

async fn play(quiz: &QuizLoopService, correct: bool) -> (QuizSession, BTreeSet<QuestionId>) {
    let mut session = quiz.start_session().await.unwrap();
    let mut asked = BTreeSet::new();
    while let Some(q) = session.current_question() {
        asked.insert(q.id());
        let pick = if correct {
            q.correct_index()
        } else {
            (q.correct_index() + 1) % 4
        };
        session = quiz.submit_answer(&session, pick).0;
        session = quiz.advance(&session).unwrap();
    }
    (session, asked)
}

#[tokio::test]
async fn missed_questions_come_back_first() {
    let storage = Storage::in_memory();
    let app = AppServices::from_storage(&storage, Clock::fixed(fixed_now())).unwrap();
    let quiz = app.quiz_loop();

    let (session, first_round) = play(&quiz, false).await;
    let finished = quiz.finish(&session).await.unwrap();
    assert_eq!(finished.record.score(), 0);
    assert_eq!(finished.record.accuracy_percent(), 0);

    let cards = storage.cards.list_cards().await.unwrap();
    assert_eq!(cards.len(), 10);
    assert!(cards.iter().all(|c| c.is_due(fixed_now())));

    let (_, second_round) = play(&quiz, true).await;
    assert_eq!(first_round, second_round);
}

#[tokio::test]
async fn learned_questions_wait_until_due() {
    let storage = Storage::in_memory();
    let today = AppServices::from_storage(&storage, Clock::fixed(fixed_now())).unwrap();

    let (session, first_round) = play(&today.quiz_loop(), true).await;
    today.quiz_loop().finish(&session).await.unwrap();

    let (_, next_round) = play(&today.quiz_loop(), true).await;
    assert!(first_round.is_disjoint(&next_round));

    let later_clock = Clock::fixed(fixed_now() + Duration::days(4));
    let later = AppServices::from_storage(&storage, later_clock).unwrap();
    later.quiz_loop().flush().await;
    today.quiz_loop().flush().await;
    let (_, due_round) = play(&later.quiz_loop(), true).await;
    let expected: BTreeSet<_> = first_round.union(&next_round).copied().collect();
    assert!(due_round.is_subset(&expected));
    assert_eq!(due_round.len(), 10);
}

#[tokio::test]
async fn settings_and_history_flow_through_app_services() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now())).unwrap();

    let mut draft = QuizSettingsDraft::new();
    draft.questions_per_session = 4;
    app.settings().save(draft).await.unwrap();

    for _ in 0..2 {
        let (session, asked) = play(&app.quiz_loop(), true).await;
        assert_eq!(asked.len(), 4);
        app.quiz_loop().finish(&session).await.unwrap();
    }

    let items = app.history().list_recent(10).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0].id > items[1].id);
    assert!(items.iter().all(|i| i.score == 40 && i.accuracy_percent == 100));
}

#[tokio::test]
async fn sqlite_backed_services_persist_sessions() {
    let url = "sqlite:file:memdb_quiz_flow?mode=memory&cache=shared";
    let app = AppServices::new_sqlite(url, Clock::fixed(fixed_now()))
        .await
        .unwrap();

    let (session, asked) = play(&app.quiz_loop(), true).await;
    let finished = app.quiz_loop().finish(&session).await.unwrap();
    assert_eq!(finished.record.total_questions(), 10);
    assert_eq!(asked.len(), 10);

    let storage = Storage::sqlite(url).await.unwrap();
    assert_eq!(storage.cards.list_cards().await.unwrap().len(), 10);
    let items = app.history().list_recent(5).await.unwrap();
    assert_eq!(items[0].id, finished.id);
}
