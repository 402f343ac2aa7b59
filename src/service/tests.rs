use super::*;
use crate::repository::InMemoryStudentRepository;
use tokio_test::{assert_err, assert_ok};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn mark(subject: &str, day: NaiveDate, score: i32) -> Mark {
    Mark::new(subject, day, score)
}

/// Fixture college:
/// 1 Vasya: Math 90, Math 85, Physics 100
/// 2 Sara:  Math 70, Math 90
/// 3 Yosef: Math 60, Math 90, Art 82
/// 4 Moshe: Art 50
/// 5 Rivka: (no marks)
async fn seeded_service() -> StudentsService<InMemoryStudentRepository> {
    let service = StudentsService::new(InMemoryStudentRepository::new());
    let students = [
        Student::new(1, "Vasya", "050-1111111"),
        Student::new(2, "Sara", "050-2222222"),
        Student::new(3, "Yosef", "052-3333333"),
        Student::new(4, "Moshe", "053-4444444"),
        Student::new(5, "Rivka", "054-5555555"),
    ];
    for student in students {
        service.add_student(student).await.unwrap();
    }

    let marks = [
        (1, mark("Math", date(2024, 1, 10), 90)),
        (1, mark("Math", date(2024, 1, 20), 85)),
        (1, mark("Physics", date(2024, 1, 31), 100)),
        (2, mark("Math", date(2024, 1, 15), 70)),
        (2, mark("Math", date(2024, 2, 1), 90)),
        (3, mark("Math", date(2024, 1, 5), 60)),
        (3, mark("Math", date(2024, 1, 6), 90)),
        (3, mark("Art", date(2024, 1, 7), 82)),
        (4, mark("Art", date(2024, 1, 8), 50)),
    ];
    for (id, m) in marks {
        service.add_mark(id, m).await.unwrap();
    }
    service
}

fn ids(students: &[Student]) -> Vec<i64> {
    students.iter().map(|s| s.id).collect()
}

#[tokio::test]
async fn test_add_student() {
    let service = StudentsService::new(InMemoryStudentRepository::new());
    let student = Student::new(8, "New Student", "123-4567890");

    let added = assert_ok!(service.add_student(student.clone()).await);
    assert_eq!(added, student);
    assert_eq!(service.repository().write_count(), 1);

    let found = service.get_student_by_phone("123-4567890").await.unwrap();
    assert_eq!(found, Some(student));
}

#[tokio::test]
async fn test_add_existing_student() {
    let service = seeded_service().await;
    let writes = service.repository().write_count();

    let err = assert_err!(
        service
            .add_student(Student::new(1, "Impostor", "000-0000000"))
            .await
    );
    assert!(err.is_already_exists());
    assert_eq!(service.repository().write_count(), writes);

    let original = service.get_student_by_phone("050-1111111").await.unwrap();
    assert_eq!(original.map(|s| s.name), Some("Vasya".to_string()));
}

#[tokio::test]
async fn test_update_phone() {
    let service = seeded_service().await;

    let updated = service.update_phone(1, "987-6543210").await.unwrap();
    assert_eq!(updated, Student::new(1, "Vasya", "987-6543210"));
    assert!(
        service
            .get_student_by_phone("050-1111111")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(service.get_marks(1).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_update_phone_for_non_existing_student() {
    let service = seeded_service().await;
    let writes = service.repository().write_count();

    let err = assert_err!(service.update_phone(10, "987-6543210").await);
    assert!(err.is_not_found());
    assert_eq!(service.repository().write_count(), writes);
}

#[tokio::test]
async fn test_add_mark_appends_in_order() {
    let service = seeded_service().await;
    let before = service.get_marks(1).await.unwrap();

    let new_mark = mark("Art", date(2024, 3, 1), 77);
    let after = service.add_mark(1, new_mark.clone()).await.unwrap();

    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
    assert_eq!(after.last(), Some(&new_mark));
    assert_eq!(service.get_marks(1).await.unwrap(), after);
}

#[tokio::test]
async fn test_add_mark_to_non_existing_student() {
    let service = seeded_service().await;
    let writes = service.repository().write_count();

    let err = assert_err!(
        service
            .add_mark(10, mark("NonExistentSubject", date(2024, 1, 1), 80))
            .await
    );
    assert!(err.is_not_found());
    assert_eq!(service.repository().write_count(), writes);
}

#[tokio::test]
async fn test_concurrent_mark_appends_are_not_lost() {
    let service = std::sync::Arc::new(seeded_service().await);
    let mut handles = Vec::new();
    for score in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .add_mark(5, mark("Math", date(2024, 4, 1), score))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(service.get_marks(5).await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_remove_existing_student() {
    let service = seeded_service().await;
    let writes = service.repository().write_count();

    let removed = service.remove_student(1).await.unwrap();
    assert_eq!(removed, Student::new(1, "Vasya", "050-1111111"));
    assert_eq!(service.repository().write_count(), writes + 1);
    assert!(service.get_marks(1).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_remove_non_existing_student() {
    let service = seeded_service().await;
    let writes = service.repository().write_count();

    let err = assert_err!(service.remove_student(10).await);
    assert!(err.is_not_found());
    assert_eq!(service.repository().write_count(), writes);
}

#[tokio::test]
async fn test_get_marks() {
    let service = seeded_service().await;
    let marks = service.get_marks(2).await.unwrap();
    assert_eq!(
        marks,
        vec![
            mark("Math", date(2024, 1, 15), 70),
            mark("Math", date(2024, 2, 1), 90),
        ]
    );
    assert!(service.get_marks(5).await.unwrap().is_empty());
    assert!(service.get_marks(10).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_get_student_by_phone_miss_is_none() {
    let service = seeded_service().await;
    assert_eq!(service.get_student_by_phone("000").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_students_by_phone_prefix() {
    let service = seeded_service().await;
    let students = service.get_students_by_phone_prefix("050").await.unwrap();
    assert_eq!(ids(&students), [1, 2]);
    assert!(
        service
            .get_students_by_phone_prefix("999")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_get_students_all_good_marks() {
    let service = seeded_service().await;
    let students = service.get_students_all_good_marks(80).await.unwrap();
    assert_eq!(ids(&students), [1]);
}

#[tokio::test]
async fn test_get_students_few_marks() {
    let service = seeded_service().await;
    let students = service.get_students_few_marks(2).await.unwrap();
    assert_eq!(ids(&students), [4, 5]);
}

#[tokio::test]
async fn test_get_students_all_good_marks_subject() {
    let service = seeded_service().await;
    // Sara [70, 90] qualifies, Yosef [60, 90] does not, Moshe has no Math.
    let students = service
        .get_students_all_good_marks_subject("Math", 70)
        .await
        .unwrap();
    assert_eq!(ids(&students), [1, 2]);
}

#[tokio::test]
async fn test_get_students_marks_amount_between() {
    let service = seeded_service().await;
    let students = service
        .get_students_marks_amount_between(2, 3)
        .await
        .unwrap();
    assert_eq!(ids(&students), [1, 2, 3]);

    let none = service
        .get_students_marks_amount_between(3, 2)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_get_student_subject_marks() {
    let service = seeded_service().await;
    let marks = service.get_student_subject_marks(3, "Math").await.unwrap();
    assert_eq!(
        marks,
        vec![
            mark("Math", date(2024, 1, 5), 60),
            mark("Math", date(2024, 1, 6), 90),
        ]
    );
    assert!(
        service
            .get_student_subject_marks(4, "Math")
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        service
            .get_student_subject_marks(10, "Math")
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_get_student_avg_score_greater() {
    let service = seeded_service().await;
    let averages = service.get_student_avg_score_greater(75).await.unwrap();
    let names: Vec<&str> = averages.iter().map(|a| a.name.as_str()).collect();
    // Vasya 91.67, Sara 80, Yosef 77.33; Moshe 50 is filtered out.
    assert_eq!(names, ["Vasya", "Sara", "Yosef"]);
    assert_eq!(averages[1].avg_score, 80.0);
}

#[tokio::test]
async fn test_get_student_marks_at_dates_includes_to() {
    let service = seeded_service().await;

    let marks = service
        .get_student_marks_at_dates(1, date(2024, 1, 10), date(2024, 1, 20))
        .await
        .unwrap();
    assert_eq!(
        marks,
        vec![
            mark("Math", date(2024, 1, 10), 90),
            mark("Math", date(2024, 1, 20), 85),
        ]
    );

    let marks = service
        .get_student_marks_at_dates(1, date(2024, 1, 11), date(2024, 1, 19))
        .await
        .unwrap();
    assert!(marks.is_empty());

    let err = service
        .get_student_marks_at_dates(10, date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_best_students() {
    let service = seeded_service().await;
    let best = service.get_best_students(2).await.unwrap();
    // Vasya has 3 marks above 80; Yosef has 2, Sara has 1.
    assert_eq!(
        best,
        [
            "ID: 1, Name: Vasya, Count: 3",
            "ID: 3, Name: Yosef, Count: 2",
        ]
    );
    assert!(service.get_best_students(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_worst_students() {
    let service = seeded_service().await;
    let worst = service.get_worst_students(2).await.unwrap();
    assert_eq!(
        worst,
        [
            "ID: 4, Name: Moshe, Total Score: 50",
            "ID: 2, Name: Sara, Total Score: 160",
        ]
    );
}
