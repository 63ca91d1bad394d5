#![cfg(feature = "sqlite")]

use chrono::{Datelike, NaiveDate, Weekday};
use critter_core::{
    Customer, DaycareService, Employee, EmployeeSkill, EntityKind, EntityStore, Id, MemoryStore,
    NewCustomer, NewEmployee, NewPet, NewSchedule, Pet, PetType, Schedule, SqliteStore,
    StoreError, StoreResult,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn skills(list: &[EmployeeSkill]) -> BTreeSet<EmployeeSkill> {
    list.iter().copied().collect()
}

/// Runs `$check` once against the in-memory store and once against SQLite.
macro_rules! on_both_stores {
    ($name:ident, $check:expr) => {
        mod $name {
            use super::*;

            #[test]
            fn memory() {
                let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
                ($check)(DaycareService::new(store));
            }

            #[test]
            fn sqlite() {
                let store: Arc<dyn EntityStore> =
                    Arc::new(SqliteStore::in_memory().expect("open sqlite"));
                ($check)(DaycareService::new(store));
            }
        }
    };
}

fn customer_with_pets(service: &DaycareService, pets: usize) -> (Id, Vec<Id>) {
    let customer = service
        .save_customer(NewCustomer::new("Orez", "222-333-444"))
        .unwrap();
    let pet_ids = (0..pets)
        .map(|_| {
            service
                .save_pet(NewPet::new(PetType::Cat, "cat", customer.id))
                .unwrap()
                .id
        })
        .collect();
    (customer.id, pet_ids)
}

/// Mirrors how the daycare books a group: employees skilled in exactly the
/// activities and available on that weekday, plus a fresh customer's pets.
fn populate_schedule(
    service: &DaycareService,
    employees: usize,
    pets: usize,
    date: NaiveDate,
    activities: BTreeSet<EmployeeSkill>,
) -> Schedule {
    let employee_ids = (0..employees)
        .map(|_| {
            service
                .save_employee(
                    NewEmployee::new("Orez")
                        .with_skills(activities.iter().copied())
                        .available_on([date.weekday()]),
                )
                .unwrap()
                .id
        })
        .collect();
    let (_, pet_ids) = customer_with_pets(service, pets);
    service
        .create_schedule(pet_ids, employee_ids, date, activities)
        .unwrap()
}

fn assert_same_schedule(expected: &Schedule, actual: &Schedule) {
    assert_eq!(expected.pet_ids, actual.pet_ids);
    assert_eq!(expected.employee_ids, actual.employee_ids);
    assert_eq!(expected.activities, actual.activities);
    assert_eq!(expected.date, actual.date);
}

on_both_stores!(create_then_read_preserves_lists, |service: DaycareService| {
    let first = service.save_employee(NewEmployee::new("A")).unwrap();
    let second = service.save_employee(NewEmployee::new("B")).unwrap();
    let (_, pets) = customer_with_pets(&service, 3);
    let pet_ids = vec![pets[2], pets[0], pets[1]];
    let employee_ids = vec![second.id, first.id];
    let activities = skills(&[EmployeeSkill::Petting]);

    let created = service
        .create_schedule(pet_ids.clone(), employee_ids.clone(), d(2023, 12, 28), activities.clone())
        .unwrap();
    assert!(created.id > 0);

    let stored = service.all_schedules().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], created);
    assert_eq!(stored[0].pet_ids, pet_ids);
    assert_eq!(stored[0].employee_ids, employee_ids);
    assert_eq!(stored[0].activities, activities);
    assert_eq!(stored[0].date, d(2023, 12, 28));
});

on_both_stores!(lookups_follow_creation_order, |service: DaycareService| {
    let s1 = populate_schedule(
        &service,
        1,
        2,
        d(2022, 12, 25),
        skills(&[EmployeeSkill::Feeding, EmployeeSkill::Walking]),
    );
    let s2 = populate_schedule(&service, 3, 1, d(2022, 12, 26), skills(&[EmployeeSkill::Petting]));
    let s3 = service
        .create_schedule(
            s2.pet_ids.clone(),
            s1.employee_ids.clone(),
            d(2023, 3, 23),
            skills(&[EmployeeSkill::Shaving, EmployeeSkill::Petting]),
        )
        .unwrap();

    let by_employee = service.schedules_for_employee(s1.employee_ids[0]).unwrap();
    assert_eq!(by_employee.len(), 2);
    assert_same_schedule(&s1, &by_employee[0]);
    assert_same_schedule(&s3, &by_employee[1]);

    let by_employee = service.schedules_for_employee(s2.employee_ids[0]).unwrap();
    assert_eq!(by_employee.len(), 1);
    assert_same_schedule(&s2, &by_employee[0]);

    let by_pet = service.schedules_for_pet(s1.pet_ids[0]).unwrap();
    assert_eq!(by_pet, vec![s1.clone()]);

    let by_pet = service.schedules_for_pet(s2.pet_ids[0]).unwrap();
    assert_eq!(by_pet, vec![s2.clone(), s3.clone()]);

    let owner = service.owner_of_pet(s1.pet_ids[0]).unwrap();
    assert_eq!(service.schedules_for_customer(owner.id).unwrap(), vec![s1.clone()]);

    let owner = service.owner_of_pet(s2.pet_ids[0]).unwrap();
    assert_eq!(
        service.schedules_for_customer(owner.id).unwrap(),
        vec![s2.clone(), s3.clone()]
    );

    assert_eq!(service.all_schedules().unwrap(), vec![s1, s2, s3]);
});

on_both_stores!(customer_schedules_start_empty, |service: DaycareService| {
    let (customer, pets) = customer_with_pets(&service, 1);
    let employee = service.save_employee(NewEmployee::new("Orez")).unwrap();
    assert!(service.schedules_for_customer(customer).unwrap().is_empty());

    let created = service
        .create_schedule(pets.clone(), vec![employee.id], d(2023, 12, 28), BTreeSet::new())
        .unwrap();
    assert_eq!(service.schedules_for_customer(customer).unwrap(), vec![created]);
});

on_both_stores!(customer_union_deduplicates, |service: DaycareService| {
    let (customer, pets) = customer_with_pets(&service, 2);
    let employee = service.save_employee(NewEmployee::new("Orez")).unwrap();
    let both = service
        .create_schedule(pets.clone(), vec![employee.id], d(2024, 1, 2), BTreeSet::new())
        .unwrap();
    let second_only = service
        .create_schedule(vec![pets[1]], vec![employee.id], d(2024, 1, 3), BTreeSet::new())
        .unwrap();
    let first_only = service
        .create_schedule(vec![pets[0]], vec![employee.id], d(2024, 1, 4), BTreeSet::new())
        .unwrap();

    let expected = vec![both, second_only, first_only];
    assert_eq!(service.schedules_for_customer(customer).unwrap(), expected);

    let mut union: Vec<Schedule> = pets
        .iter()
        .flat_map(|pet| service.schedules_for_pet(*pet).unwrap())
        .collect();
    union.sort_by_key(|s| s.id);
    union.dedup_by_key(|s| s.id);
    assert_eq!(union, expected);
});

on_both_stores!(unknown_ids_fail_without_side_effects, |service: DaycareService| {
    let (_, pets) = customer_with_pets(&service, 1);
    let employee = service.save_employee(NewEmployee::new("Orez")).unwrap();

    let err = service
        .create_schedule(vec![pets[0], 404], vec![employee.id], d(2024, 1, 2), BTreeSet::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: EntityKind::Pet, id: 404 }));

    let err = service
        .create_schedule(pets.clone(), vec![employee.id, 77], d(2024, 1, 2), BTreeSet::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: EntityKind::Employee, id: 77 }));

    assert!(service.all_schedules().unwrap().is_empty());
    assert!(service.schedules_for_pet(pets[0]).unwrap().is_empty());
    assert!(service.schedules_for_employee(employee.id).unwrap().is_empty());

    assert!(service.schedules_for_customer(999).unwrap_err().is_not_found());
    assert!(service.schedules_for_employee(999).unwrap_err().is_not_found());
    assert!(service.schedules_for_pet(999).unwrap_err().is_not_found());
});

on_both_stores!(skills_are_not_revalidated, |service: DaycareService| {
    let (_, pets) = customer_with_pets(&service, 1);
    let groomer = service
        .save_employee(NewEmployee::new("Orez").with_skills([EmployeeSkill::Feeding]))
        .unwrap();
    // Neither skilled in shaving nor available on any day; still accepted.
    let created = service
        .create_schedule(
            pets,
            vec![groomer.id],
            d(2024, 1, 6),
            skills(&[EmployeeSkill::Shaving]),
        )
        .unwrap();
    assert_eq!(created.activities, skills(&[EmployeeSkill::Shaving]));
});

on_both_stores!(reads_are_idempotent, |service: DaycareService| {
    let s1 = populate_schedule(&service, 2, 2, d(2022, 12, 25), skills(&[EmployeeSkill::Walking]));
    populate_schedule(&service, 1, 1, d(2022, 12, 26), skills(&[EmployeeSkill::Feeding]));

    assert_eq!(service.all_schedules().unwrap(), service.all_schedules().unwrap());
    let employee = s1.employee_ids[1];
    assert_eq!(
        service.schedules_for_employee(employee).unwrap(),
        service.schedules_for_employee(employee).unwrap()
    );
    let owner = service.owner_of_pet(s1.pet_ids[0]).unwrap();
    assert_eq!(
        service.schedules_for_customer(owner.id).unwrap(),
        service.schedules_for_customer(owner.id).unwrap()
    );
});

on_both_stores!(employee_changes_do_not_touch_schedules, |service: DaycareService| {
    let created = populate_schedule(&service, 1, 1, d(2022, 12, 25), skills(&[EmployeeSkill::Walking]));
    let employee = created.employee_ids[0];

    service
        .set_skills(employee, skills(&[EmployeeSkill::Medicating]))
        .unwrap();
    service.set_availability(employee, Default::default()).unwrap();

    let stored = service.schedules_for_employee(employee).unwrap();
    assert_eq!(stored, vec![created]);
    assert_eq!(stored[0].activities, skills(&[EmployeeSkill::Walking]));
});

on_both_stores!(customers_track_their_pets, |service: DaycareService| {
    let (customer, pets) = customer_with_pets(&service, 2);
    let stored = service.customer(customer).unwrap();
    assert_eq!(stored.pet_ids, pets);
    assert_eq!(service.all_customers().unwrap()[0].pet_ids, pets);

    let owned = service.pets_by_owner(customer).unwrap();
    assert_eq!(owned.iter().map(|p| p.id).collect::<Vec<_>>(), pets);
    assert!(owned.iter().all(|p| p.owner_id == customer));
    assert_eq!(service.owner_of_pet(pets[1]).unwrap().id, customer);

    let err = service
        .save_pet(NewPet::new(PetType::Dog, "rex", 42))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: EntityKind::Customer, id: 42 }));
});

#[test]
fn sqlite_schedules_survive_reopen() {
    let file = NamedTempFile::new().unwrap();
    let created = {
        let store: Arc<dyn EntityStore> = Arc::new(SqliteStore::new(file.path()).unwrap());
        let service = DaycareService::new(store);
        populate_schedule(&service, 2, 3, d(2023, 3, 23), skills(&[EmployeeSkill::Petting]))
    };

    let store: Arc<dyn EntityStore> = Arc::new(SqliteStore::new(file.path()).unwrap());
    let service = DaycareService::new(store);
    assert_eq!(service.all_schedules().unwrap(), vec![created.clone()]);
    let owner = service.owner_of_pet(created.pet_ids[0]).unwrap();
    assert_eq!(owner.pet_ids, created.pet_ids);

    let next = service.save_customer(NewCustomer::new("Ana", "555")).unwrap();
    assert_eq!(next.id, owner.id + 1);
}

/// Serves every read from memory but loses the connection on schedule writes.
struct ScheduleWritesFail(MemoryStore);

impl EntityStore for ScheduleWritesFail {
    fn save_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        self.0.save_customer(customer)
    }
    fn find_customer(&self, id: Id) -> StoreResult<Customer> {
        self.0.find_customer(id)
    }
    fn all_customers(&self) -> StoreResult<Vec<Customer>> {
        self.0.all_customers()
    }
    fn owner_of_pet(&self, pet_id: Id) -> StoreResult<Customer> {
        self.0.owner_of_pet(pet_id)
    }
    fn save_pet(&self, pet: NewPet) -> StoreResult<Pet> {
        self.0.save_pet(pet)
    }
    fn find_pet(&self, id: Id) -> StoreResult<Pet> {
        self.0.find_pet(id)
    }
    fn all_pets(&self) -> StoreResult<Vec<Pet>> {
        self.0.all_pets()
    }
    fn pets_by_owner(&self, customer_id: Id) -> StoreResult<Vec<Pet>> {
        self.0.pets_by_owner(customer_id)
    }
    fn save_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        self.0.save_employee(employee)
    }
    fn find_employee(&self, id: Id) -> StoreResult<Employee> {
        self.0.find_employee(id)
    }
    fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        self.0.all_employees()
    }
    fn update_employee_availability(&self, id: Id, days: HashSet<Weekday>) -> StoreResult<Employee> {
        self.0.update_employee_availability(id, days)
    }
    fn update_employee_skills(&self, id: Id, skills: BTreeSet<EmployeeSkill>) -> StoreResult<Employee> {
        self.0.update_employee_skills(id, skills)
    }
    fn save_schedule(&self, _: NewSchedule) -> StoreResult<Schedule> {
        Err(StoreError::unavailable("connection reset"))
    }
    fn find_schedule(&self, id: Id) -> StoreResult<Schedule> {
        self.0.find_schedule(id)
    }
    fn all_schedules(&self) -> StoreResult<Vec<Schedule>> {
        self.0.all_schedules()
    }
    fn schedules_by_employee(&self, employee_id: Id) -> StoreResult<Vec<Schedule>> {
        self.0.schedules_by_employee(employee_id)
    }
    fn schedules_by_pet(&self, pet_id: Id) -> StoreResult<Vec<Schedule>> {
        self.0.schedules_by_pet(pet_id)
    }
}

#[test]
fn failed_schedule_write_is_reported_and_leaves_nothing() {
    let store: Arc<dyn EntityStore> = Arc::new(ScheduleWritesFail(MemoryStore::new()));
    let service = DaycareService::new(store);
    let (customer, pets) = customer_with_pets(&service, 2);
    let employee = service.save_employee(NewEmployee::new("Orez")).unwrap();

    let err = service
        .create_schedule(pets.clone(), vec![employee.id], d(2024, 1, 2), BTreeSet::new())
        .unwrap_err();
    assert!(matches!(&err, StoreError::Unavailable(message) if message == "connection reset"));
    assert!(!err.is_not_found());

    assert!(service.all_schedules().unwrap().is_empty());
    assert!(service.schedules_for_employee(employee.id).unwrap().is_empty());
    assert!(service.schedules_for_customer(customer).unwrap().is_empty());
}
