use chrono::NaiveDate;

use super::catalog::{Master, Salon, Service};

/// Шаг диалога записи. Каждый вариант несёт все предыдущие выборы,
/// поэтому нельзя выбрать мастера, не выбрав услугу.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    AwaitingSalon,
    AwaitingService {
        salon: Salon,
    },
    AwaitingMaster {
        salon: Salon,
        service: Service,
    },
    AwaitingDate {
        salon: Salon,
        service: Service,
        master: Master,
    },
    AwaitingTime {
        salon: Salon,
        service: Service,
        master: Master,
        date: NaiveDate,
    },
}

impl ConversationState {
    pub fn name(&self) -> &'static str {
        match self {
            ConversationState::AwaitingSalon => "awaiting_salon",
            ConversationState::AwaitingService { .. } => "awaiting_service",
            ConversationState::AwaitingMaster { .. } => "awaiting_master",
            ConversationState::AwaitingDate { .. } => "awaiting_date",
            ConversationState::AwaitingTime { .. } => "awaiting_time",
        }
    }

    /// Шаг назад к выбору мастера, если услуга уже выбрана.
    pub fn back_to_master(&self) -> Option<ConversationState> {
        match self {
            ConversationState::AwaitingMaster { salon, service }
            | ConversationState::AwaitingDate { salon, service, .. }
            | ConversationState::AwaitingTime { salon, service, .. } => {
                Some(ConversationState::AwaitingMaster {
                    salon: salon.clone(),
                    service: service.clone(),
                })
            }
            _ => None,
        }
    }
}
