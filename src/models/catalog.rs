use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Рейтинг мастера с одним знаком после запятой, хранится в десятых долях.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rating(u8);

impl Rating {
    pub const fn from_tenths(tenths: u8) -> Self {
        Rating(tenths)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salon {
    pub id: u32,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Master {
    pub name: String,
    pub rating: Rating,
}

impl Master {
    /// Подпись кнопки: "Анна ⭐4.9".
    pub fn label(&self) -> String {
        format!("{} ⭐{}", self.name, self.rating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: u32,
    pub name: String,
    pub duration: String,
    pub masters: Vec<Master>,
}

/// Справочник салонов, услуг и мастеров.
#[derive(Debug, Clone)]
pub struct Catalog {
    salons: Vec<Salon>,
    services: Vec<Service>,
}

impl Catalog {
    pub fn new(salons: Vec<Salon>, services: Vec<Service>) -> Result<Self, ConfigError> {
        let catalog = Catalog { salons, services };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Пустой справочник проверяется при запуске, а не во время диалога.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.salons.is_empty() {
            return Err(ConfigError::EmptyCatalog("no salons"));
        }
        if self.services.is_empty() {
            return Err(ConfigError::EmptyCatalog("no services"));
        }
        if self.services.iter().any(|s| s.masters.is_empty()) {
            return Err(ConfigError::EmptyCatalog("service without masters"));
        }
        Ok(())
    }

    pub fn salons(&self) -> &[Salon] {
        &self.salons
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn masters_for(&self, service: &Service) -> &[Master] {
        self.services
            .iter()
            .find(|s| s.id == service.id)
            .map(|s| s.masters.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_salon(&self, text: &str) -> Option<&Salon> {
        let text = text.trim();
        self.salons.iter().find(|s| s.name == text)
    }

    pub fn find_service(&self, text: &str) -> Option<&Service> {
        let text = text.trim();
        self.services.iter().find(|s| s.name == text)
    }

    /// Принимает как подпись кнопки, так и просто имя мастера.
    pub fn find_master(&self, service: &Service, text: &str) -> Option<&Master> {
        let text = text.trim();
        self.masters_for(service)
            .iter()
            .find(|m| m.name == text || m.label() == text)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let anna = Master {
            name: "Анна".to_string(),
            rating: Rating::from_tenths(49),
        };
        let maria = Master {
            name: "Мария".to_string(),
            rating: Rating::from_tenths(48),
        };
        let elena = Master {
            name: "Елена".to_string(),
            rating: Rating::from_tenths(47),
        };

        Catalog {
            salons: vec![
                Salon {
                    id: 1,
                    name: "BeautyTime на Тверской".to_string(),
                    address: "ул. Тверская, 12".to_string(),
                },
                Salon {
                    id: 2,
                    name: "BeautyTime на Арбате".to_string(),
                    address: "ул. Арбат, 24".to_string(),
                },
            ],
            services: vec![
                Service {
                    id: 1,
                    name: "Оформление бровей".to_string(),
                    duration: "30 мин".to_string(),
                    masters: vec![anna.clone(), maria.clone()],
                },
                Service {
                    id: 2,
                    name: "Окрашивание хной".to_string(),
                    duration: "45 мин".to_string(),
                    masters: vec![maria, elena.clone()],
                },
                Service {
                    id: 3,
                    name: "Ламинирование".to_string(),
                    duration: "1 час".to_string(),
                    masters: vec![anna, elena],
                },
            ],
        }
    }
}
