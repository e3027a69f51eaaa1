pub const CHOOSE_SALON: &str = "Привет! Выбери салон:";
pub const CHOOSE_SALON_AGAIN: &str = "Пожалуйста, выбери салон из списка.";
pub const CHOOSE_SERVICE: &str = "Выбери процедуру:";
pub const CHOOSE_SERVICE_AGAIN: &str = "Пожалуйста, выбери услугу из списка.";
pub const SHOW_ALL_SERVICES: &str = "Показать все услуги";
pub const ALL_SERVICES_HEADER: &str = "Доступные услуги:";
pub const CHOOSE_MASTER: &str = "Выбери мастера:";
pub const CHOOSE_MASTER_AGAIN: &str = "Пожалуйста, выбери мастера из списка.";
pub const CHOOSE_DATE: &str = "Выберите дату:";
pub const CHOOSE_DATE_AGAIN: &str = "Эта дата недоступна, выберите дату из списка:";
pub const CHOOSE_TIME: &str = "Выберите время или напишите его (например: 11:00):";
pub const CHOOSE_TIME_AGAIN: &str = "Это время недоступно, выберите время из списка:";
pub const TIME_UNPARSABLE: &str =
    "Не удалось разобрать время, попробуйте ещё раз (например: 11:00):";
pub const NO_TIMES_LEFT: &str = "На эту дату свободного времени не осталось, выберите другую дату:";
pub const BACK_TO_MASTER: &str = "◀️ Назад к выбору мастера";
pub const RESTART_REQUIRED: &str = "Пожалуйста, выберите услугу сначала (/start).";
pub const BOOKED: &str = "Спасибо! Вы записаны.";
pub const BOOKING_FAILED: &str = "Не удалось сохранить запись, попробуйте выбрать время ещё раз.";
pub const ALREADY_BOOKED: &str =
    "У вас уже есть запись. Чтобы записаться заново, сначала отмените текущую.";
pub const CANCELLED: &str = "Запись отменена.";
pub const NOTHING_TO_CANCEL: &str = "У вас нет активной записи.";
pub const CANCEL_FAILED: &str = "Не удалось отменить запись, попробуйте позже.";
pub const CANCEL_BUTTON: &str = "❌ Отменить запись";
pub const UNKNOWN_ACTION: &str = "Эта кнопка больше не активна. Начните заново: /start";
pub const USER_SUMMARY_HEADER: &str = "📌 Ваша запись";
pub const ADMIN_SUMMARY_HEADER: &str = "📌 Предстоящие записи";
pub const ADMIN_SUMMARY_EMPTY: &str = "Нет предстоящих записей.";
pub const NEW_BOOKING_HEADER: &str = "📋 Новая запись!";
