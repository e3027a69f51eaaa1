//! Тексты закреплённых сводок и уведомлений.

use crate::models::Appointment;
use crate::texts;
use crate::transport::{InlineButton, Keyboard};

pub const CANCEL_APPOINTMENT: &str = "cancel_appointment";

pub fn render_user_summary(appointment: &Appointment) -> (String, Keyboard) {
    let text = format!(
        "{}\n\n\
        Салон: {} ({})\n\
        Услуга: {} ({})\n\
        Мастер: {} (⭐{})\n\
        Дата: {}\n\
        Время: {}",
        texts::USER_SUMMARY_HEADER,
        appointment.salon.name,
        appointment.salon.address,
        appointment.service.name,
        appointment.service.duration,
        appointment.master.name,
        appointment.master.rating,
        appointment.date.format("%Y-%m-%d"),
        appointment.time.format("%H:%M"),
    );
    let keyboard = Keyboard::Inline(vec![vec![InlineButton::new(
        texts::CANCEL_BUTTON,
        CANCEL_APPOINTMENT,
    )]]);
    (text, keyboard)
}

/// Ожидает список, уже отсортированный по времени.
pub fn render_admin_summary(upcoming: &[Appointment]) -> String {
    if upcoming.is_empty() {
        return format!("{}\n\n{}", texts::ADMIN_SUMMARY_HEADER, texts::ADMIN_SUMMARY_EMPTY);
    }

    let lines: Vec<String> = upcoming
        .iter()
        .map(|a| {
            format!(
                "{} — {} у мастера {}\n    {}, {}",
                a.slot_label(),
                a.service.name,
                a.master.name,
                a.salon.name,
                a.username
            )
        })
        .collect();
    format!("{}\n\n{}", texts::ADMIN_SUMMARY_HEADER, lines.join("\n"))
}

pub fn render_new_booking_notice(appointment: &Appointment) -> String {
    format!(
        "{}\n\
        Салон: {}\n\
        Услуга: {}\n\
        Мастер: {} (⭐{})\n\
        Дата: {}\n\
        Время: {}\n\
        Пользователь: {}",
        texts::NEW_BOOKING_HEADER,
        appointment.salon.name,
        appointment.service.name,
        appointment.master.name,
        appointment.master.rating,
        appointment.date.format("%Y-%m-%d"),
        appointment.time.format("%H:%M"),
        appointment.username,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::ChatId;
    use crate::models::{Catalog, SlotGenerator};
    use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

    fn appointment(user: i64, day: u32, hour: u32) -> Appointment {
        let catalog = Catalog::default();
        let service = catalog.services()[0].clone();
        let master = service.masters[1].clone();
        let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        Appointment {
            user_id: ChatId(user),
            username: "@client".to_string(),
            salon: catalog.salons()[0].clone(),
            service,
            master,
            date,
            time,
            starts_at: SlotGenerator::new(FixedOffset::east_opt(3 * 3600).unwrap())
                .resolve(date, time)
                .unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 9, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn user_summary_has_all_fields_and_cancel_action() {
        let (text, keyboard) = render_user_summary(&appointment(1, 10, 11));
        assert!(text.contains("BeautyTime на Тверской"));
        assert!(text.contains("Оформление бровей"));
        assert!(text.contains("Мария (⭐4.8)"));
        assert!(text.contains("Дата: 2024-06-10"));
        assert!(text.contains("Время: 11:00"));
        assert_eq!(
            keyboard,
            Keyboard::Inline(vec![vec![InlineButton::new(
                texts::CANCEL_BUTTON,
                CANCEL_APPOINTMENT
            )]])
        );
    }

    #[test]
    fn admin_summary_lists_one_line_per_appointment() {
        let text = render_admin_summary(&[appointment(1, 10, 11), appointment(2, 11, 10)]);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"2024-06-10 11:00 — Оформление бровей у мастера Мария"));
        assert!(lines.contains(&"2024-06-11 10:00 — Оформление бровей у мастера Мария"));
        let first = text.find("2024-06-10").unwrap();
        let second = text.find("2024-06-11").unwrap();
        assert!(first < second);
    }

    #[test]
    fn empty_admin_summary_has_placeholder() {
        let text = render_admin_summary(&[]);
        assert!(text.ends_with(texts::ADMIN_SUMMARY_EMPTY));
    }

    #[test]
    fn new_booking_notice_names_the_client() {
        let text = render_new_booking_notice(&appointment(1, 10, 11));
        assert!(text.starts_with(texts::NEW_BOOKING_HEADER));
        assert!(text.contains("Пользователь: @client"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = appointment(1, 10, 11);
        assert_eq!(render_user_summary(&a), render_user_summary(&a));
        assert_eq!(render_admin_summary(&[a.clone()]), render_admin_summary(&[a]));
    }
}
