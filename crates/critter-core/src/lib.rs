pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod matcher;
pub mod model;
pub mod persistence;
pub mod scheduling;
pub mod service;

pub use config::{ConfigError, CritterConfig, StoreConfig};
pub use matcher::{AvailabilityMatcher, is_qualified};
pub use model::{
    Customer, Employee, EmployeeSkill, EntityKind, Id, NewCustomer, NewEmployee, NewPet,
    NewSchedule, Pet, PetType, Schedule,
};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteStore;
pub use persistence::{
    EntityStore, MemoryStore, StoreError, StoreResult, StoreSnapshot, export_schedules_to_csv,
    load_snapshot_from_json, save_snapshot_to_json,
};
pub use scheduling::ScheduleManager;
pub use service::DaycareService;
