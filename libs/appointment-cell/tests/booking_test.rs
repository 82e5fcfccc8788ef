use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};

use appointment_cell::models::{
    AppointmentStatus, BookAppointmentRequest, BookingError, UpdateAppointmentRequest,
};
use appointment_cell::services::booking::BookingService;
use appointment_cell::store::MemoryAppointmentStore;
use doctor_cell::models::Doctor;
use doctor_cell::store::MemoryDoctorStore;
use patient_cell::models::Patient;
use patient_cell::store::MemoryPatientStore;

fn doctor(id: i64) -> Doctor {
    Doctor {
        id,
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        email: format!("doctor{}@clinic.example", id),
        specialization: "Cardiology".to_string(),
        phone: None,
        is_available: true,
        working_days: Some("Mon-Fri".to_string()),
        working_hours_start: NaiveTime::from_hms_opt(9, 0, 0),
        working_hours_end: NaiveTime::from_hms_opt(17, 0, 0),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn patient(id: i64) -> Patient {
    Patient {
        id,
        first_name: "Priya".to_string(),
        last_name: "Shah".to_string(),
        email: format!("patient{}@example.com", id),
        phone: None,
        address: None,
        date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn service_with_store() -> (BookingService, Arc<MemoryAppointmentStore>) {
    let store = Arc::new(MemoryAppointmentStore::new());

    let doctors = Arc::new(MemoryDoctorStore::new());
    doctors.insert(doctor(7));
    doctors.insert(doctor(8));

    let patients = Arc::new(MemoryPatientStore::new());
    patients.insert(patient(41));
    patients.insert(patient(42));

    let service = BookingService::new(store.clone(), doctors, patients);
    (service, store)
}

fn service() -> BookingService {
    service_with_store().0
}

fn booking(
    doctor_id: i64,
    patient_id: i64,
    date: &str,
    time: Option<&str>,
) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id,
        doctor_id,
        date: date.to_string(),
        time: time.map(String::from),
        reason: Some("Routine checkup".to_string()),
        notes: None,
        appointment_type: None,
    }
}

fn status_update(status: &str) -> UpdateAppointmentRequest {
    UpdateAppointmentRequest {
        status: Some(status.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn booking_creates_a_scheduled_appointment() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.appointment_type, "Consultation");
    assert_eq!(appointment.doctor_id, 7);
    assert_eq!(appointment.patient_id, 41);
    assert_eq!(
        appointment.appointment_time,
        NaiveTime::from_hms_opt(9, 0, 0)
    );
}

#[tokio::test]
async fn double_booking_the_same_slot_conflicts() {
    let service = service();

    service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    let second = service.book(booking(7, 41, "2024-03-01", Some("09:00"))).await;
    assert_matches!(second, Err(BookingError::SlotConflict));
}

#[tokio::test]
async fn conflict_does_not_depend_on_patient_or_reason() {
    let service = service();

    service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    let mut other = booking(7, 42, "2024-03-01", Some("09:00"));
    other.reason = Some("Something entirely different".to_string());

    assert_matches!(service.book(other).await, Err(BookingError::SlotConflict));
}

#[tokio::test]
async fn cancelled_slot_can_be_rebooked() {
    let service = service();

    let first = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    let cancelled = service.cancel(first.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let second = service
        .book(booking(7, 42, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    assert_ne!(second.id, first.id);
}

#[tokio::test]
async fn distinct_times_on_the_same_day_both_succeed() {
    let service = service();

    service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    service
        .book(booking(7, 42, "2024-03-01", Some("09:30")))
        .await
        .unwrap();
}

#[tokio::test]
async fn distinct_doctors_share_no_slots() {
    let service = service();

    service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    service
        .book(booking(8, 42, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
}

#[tokio::test]
async fn unparsable_date_creates_no_record() {
    let (service, store) = service_with_store();

    let result = service.book(booking(7, 41, "not-a-date", Some("09:00"))).await;

    assert_matches!(result, Err(BookingError::InvalidSlot(_)));
    assert!(store.all().is_empty());
}

#[tokio::test]
async fn second_precision_input_lands_on_the_same_slot() {
    let service = service();

    service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    let with_seconds = service
        .book(booking(7, 42, "2024-03-01", Some("09:00:00")))
        .await;
    assert_matches!(with_seconds, Err(BookingError::SlotConflict));
}

#[tokio::test]
async fn checked_in_appointments_still_hold_their_slot() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    service
        .update(appointment.id, status_update("checked-in"))
        .await
        .unwrap();

    let rebook = service.book(booking(7, 42, "2024-03-01", Some("09:00"))).await;
    assert_matches!(rebook, Err(BookingError::SlotConflict));
}

#[tokio::test]
async fn date_only_bookings_occupy_one_daily_slot() {
    let service = service();

    service.book(booking(7, 41, "2024-03-01", None)).await.unwrap();

    let second = service.book(booking(7, 42, "2024-03-01", None)).await;
    assert_matches!(second, Err(BookingError::SlotConflict));
}

#[tokio::test]
async fn date_only_and_timed_bookings_coexist() {
    let service = service();

    service.book(booking(7, 41, "2024-03-01", None)).await.unwrap();
    service
        .book(booking(7, 42, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
}

#[tokio::test]
async fn rescheduling_onto_a_taken_slot_conflicts() {
    let service = service();

    service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    let movable = service
        .book(booking(7, 42, "2024-03-01", Some("09:30")))
        .await
        .unwrap();

    let result = service
        .update(
            movable.id,
            UpdateAppointmentRequest {
                time: Some("09:00".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert_matches!(result, Err(BookingError::SlotConflict));
}

#[tokio::test]
async fn rescheduling_does_not_conflict_with_itself() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    // Same slot plus a reason edit: the exclusion keeps the record from
    // colliding with its own booking.
    let updated = service
        .update(
            appointment.id,
            UpdateAppointmentRequest {
                date: Some("2024-03-01".to_string()),
                time: Some("09:00:00".to_string()),
                reason: Some("Follow-up instead".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, appointment.id);
    assert_eq!(updated.reason.as_deref(), Some("Follow-up instead"));
}

#[tokio::test]
async fn rescheduling_away_frees_the_old_slot() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    service
        .update(
            appointment.id,
            UpdateAppointmentRequest {
                time: Some("10:00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    service
        .book(booking(7, 42, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_doctor_is_reported_before_any_write() {
    let (service, store) = service_with_store();

    let result = service.book(booking(99, 41, "2024-03-01", Some("09:00"))).await;

    assert_matches!(result, Err(BookingError::DoctorNotFound));
    assert!(store.all().is_empty());
}

#[tokio::test]
async fn unknown_patient_is_reported_before_any_write() {
    let service = service();

    let result = service.book(booking(7, 99, "2024-03-01", Some("09:00"))).await;
    assert_matches!(result, Err(BookingError::PatientNotFound));
}

#[tokio::test]
async fn undefined_status_values_are_rejected_not_stored() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    let result = service.update(appointment.id, status_update("postponed")).await;
    assert_matches!(result, Err(BookingError::InvalidStatus(_)));

    let unchanged = service.get(appointment.id).await.unwrap();
    assert_eq!(unchanged.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn completed_appointments_cannot_be_cancelled() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    service
        .update(appointment.id, status_update("completed"))
        .await
        .unwrap();

    assert_matches!(
        service.cancel(appointment.id).await,
        Err(BookingError::InvalidStatusTransition(_, _))
    );
}

#[tokio::test]
async fn hard_delete_requires_a_completed_appointment() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();

    assert_matches!(
        service.hard_delete(appointment.id).await,
        Err(BookingError::HardDeletePrecondition)
    );
}

#[tokio::test]
async fn hard_delete_removes_the_record_and_frees_the_slot() {
    let service = service();

    let appointment = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    service
        .update(appointment.id, status_update("completed"))
        .await
        .unwrap();

    service.hard_delete(appointment.id).await.unwrap();

    assert_matches!(
        service.get(appointment.id).await,
        Err(BookingError::NotFound)
    );
    service
        .book(booking(7, 42, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_bookings_admit_exactly_one_winner() {
    let (service, _) = service_with_store();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        let patient_id = if i % 2 == 0 { 41 } else { 42 };
        handles.push(tokio::spawn(async move {
            service
                .book(booking(7, patient_id, "2024-03-01", Some("09:00")))
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(BookingError::SlotConflict) => conflicts += 1,
            Err(other) => panic!("unexpected booking error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn booked_projections_exclude_cancelled_appointments() {
    let service = service();

    let kept = service
        .book(booking(7, 41, "2024-03-01", Some("09:00")))
        .await
        .unwrap();
    let dropped = service
        .book(booking(7, 42, "2024-03-01", Some("09:30")))
        .await
        .unwrap();
    service
        .book(booking(7, 41, "2024-03-02", None))
        .await
        .unwrap();
    service.cancel(dropped.id).await.unwrap();

    let dates = service.conflicts().booked_dates(7).await.unwrap();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        ]
    );

    // The cancelled 09:30 is gone and the date-only booking has no time
    // to report.
    let times = service
        .conflicts()
        .booked_times(7, kept.appointment_date)
        .await
        .unwrap();
    assert_eq!(times, vec![NaiveTime::from_hms_opt(9, 0, 0).unwrap()]);
}
