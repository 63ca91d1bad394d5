use super::{EntityStore, StoreError, StoreResult};
use crate::model::{
    Customer, Employee, EmployeeSkill, EntityKind, Id, NewCustomer, NewEmployee, NewPet,
    NewSchedule, Pet, PetType, Schedule, weekdays,
};
use chrono::{NaiveDate, Weekday};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed store. Skill and day sets live in JSON columns; the
/// schedule links keep a `position` column so employee and pet lists come
/// back in the order they were given.
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> StoreResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                notes TEXT
            );
            CREATE TABLE IF NOT EXISTS pets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL REFERENCES customers(id),
                pet_type TEXT NOT NULL,
                name TEXT NOT NULL,
                birth_date TEXT,
                notes TEXT
            );
            CREATE INDEX IF NOT EXISTS pets_by_customer ON pets(customer_id);
            CREATE TABLE IF NOT EXISTS employees (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                skills_json TEXT NOT NULL,
                days_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS schedules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                activities_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS employee_scheduled (
                schedule_id INTEGER NOT NULL REFERENCES schedules(id),
                employee_id INTEGER NOT NULL REFERENCES employees(id),
                position INTEGER NOT NULL,
                PRIMARY KEY (schedule_id, position)
            );
            CREATE INDEX IF NOT EXISTS employee_scheduled_by_employee
                ON employee_scheduled(employee_id);
            CREATE TABLE IF NOT EXISTS pet_scheduled (
                schedule_id INTEGER NOT NULL REFERENCES schedules(id),
                pet_id INTEGER NOT NULL REFERENCES pets(id),
                position INTEGER NOT NULL,
                PRIMARY KEY (schedule_id, position)
            );
            CREATE INDEX IF NOT EXISTS pet_scheduled_by_pet ON pet_scheduled(pet_id);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| StoreError::unavailable("sqlite connection mutex poisoned"))
    }

    fn exists(conn: &Connection, table: &str, id: Id) -> StoreResult<bool> {
        let sql = format!("SELECT 1 FROM {table} WHERE id = ?1");
        let found = conn
            .query_row(&sql, params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn require(conn: &Connection, kind: EntityKind, id: Id) -> StoreResult<()> {
        let table = match kind {
            EntityKind::Customer => "customers",
            EntityKind::Pet => "pets",
            EntityKind::Employee => "employees",
            EntityKind::Schedule => "schedules",
        };
        if Self::exists(conn, table, id)? {
            Ok(())
        } else {
            Err(StoreError::not_found(kind, id))
        }
    }

    fn load_customer(conn: &Connection, id: Id) -> StoreResult<Customer> {
        let row = conn
            .query_row(
                "SELECT name, phone_number, notes FROM customers WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((name, phone_number, notes)) = row else {
            return Err(StoreError::not_found(EntityKind::Customer, id));
        };
        let mut stmt = conn.prepare("SELECT id FROM pets WHERE customer_id = ?1 ORDER BY id ASC")?;
        let pet_ids = stmt
            .query_map(params![id], id_column)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Customer {
            id,
            name,
            phone_number,
            notes,
            pet_ids,
        })
    }

    fn load_pet(conn: &Connection, id: Id) -> StoreResult<Pet> {
        let row = conn
            .query_row(
                "SELECT customer_id, pet_type, name, birth_date, notes FROM pets WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, Id>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<NaiveDate>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((owner_id, pet_type, name, birth_date, notes)) = row else {
            return Err(StoreError::not_found(EntityKind::Pet, id));
        };
        let pet_type = pet_type
            .parse::<PetType>()
            .map_err(|err| StoreError::unavailable(format!("pet {id}: {err}")))?;
        Ok(Pet {
            id,
            pet_type,
            name,
            owner_id,
            birth_date,
            notes,
        })
    }

    fn load_employee(conn: &Connection, id: Id) -> StoreResult<Employee> {
        let row = conn
            .query_row(
                "SELECT name, skills_json, days_json FROM employees WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((name, skills_json, days_json)) = row else {
            return Err(StoreError::not_found(EntityKind::Employee, id));
        };
        Ok(Employee {
            id,
            name,
            skills: serde_json::from_str(&skills_json)?,
            days_available: decode_days(&days_json)?,
        })
    }

    fn load_schedule(conn: &Connection, id: Id) -> StoreResult<Schedule> {
        let row = conn
            .query_row(
                "SELECT date, activities_json FROM schedules WHERE id = ?1",
                params![id],
                |row| Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((date, activities_json)) = row else {
            return Err(StoreError::not_found(EntityKind::Schedule, id));
        };
        Ok(Schedule {
            id,
            employee_ids: Self::linked_ids(conn, "employee_scheduled", "employee_id", id)?,
            pet_ids: Self::linked_ids(conn, "pet_scheduled", "pet_id", id)?,
            date,
            activities: serde_json::from_str(&activities_json)?,
        })
    }

    fn linked_ids(conn: &Connection, table: &str, column: &str, schedule_id: Id) -> StoreResult<Vec<Id>> {
        let sql = format!("SELECT {column} FROM {table} WHERE schedule_id = ?1 ORDER BY position ASC");
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![schedule_id], id_column)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn ids(conn: &Connection, sql: &str, param: Option<Id>) -> StoreResult<Vec<Id>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = match param {
            Some(value) => stmt.query_map(params![value], id_column)?,
            None => stmt.query_map([], id_column)?,
        };
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn schedules_linked_by(
        &self,
        kind: EntityKind,
        table: &str,
        column: &str,
        id: Id,
    ) -> StoreResult<Vec<Schedule>> {
        let conn = self.lock()?;
        Self::require(&conn, kind, id)?;
        let sql = format!(
            "SELECT DISTINCT schedule_id FROM {table} WHERE {column} = ?1 ORDER BY schedule_id ASC"
        );
        Self::ids(&conn, &sql, Some(id))?
            .into_iter()
            .map(|schedule_id| Self::load_schedule(&conn, schedule_id))
            .collect()
    }

    fn insert_links(tx: &Transaction, table: &str, column: &str, schedule_id: Id, ids: &[Id]) -> StoreResult<()> {
        let sql = format!("INSERT INTO {table} (schedule_id, {column}, position) VALUES (?1, ?2, ?3)");
        let mut stmt = tx.prepare(&sql)?;
        for (position, id) in ids.iter().enumerate() {
            stmt.execute(params![schedule_id, id, position as i64])?;
        }
        Ok(())
    }

    fn update_employee_column(&self, id: Id, column: &str, json: String) -> StoreResult<Employee> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let sql = format!("UPDATE employees SET {column} = ?1 WHERE id = ?2");
        let changed = tx.execute(&sql, params![json, id])?;
        if changed == 0 {
            return Err(StoreError::not_found(EntityKind::Employee, id));
        }
        tx.commit()?;
        Self::load_employee(&conn, id)
    }
}

fn id_column(row: &rusqlite::Row<'_>) -> rusqlite::Result<Id> {
    row.get(0)
}

/// Day sets are stored with the same names the JSON API uses.
fn encode_days(days: &HashSet<Weekday>) -> StoreResult<String> {
    let names: Vec<&str> = weekdays::sorted(days).into_iter().map(weekdays::full_name).collect();
    Ok(serde_json::to_string(&names)?)
}

fn decode_days(json: &str) -> StoreResult<HashSet<Weekday>> {
    let names: Vec<String> = serde_json::from_str(json)?;
    names
        .iter()
        .map(|name| {
            name.parse::<Weekday>()
                .map_err(|_| StoreError::unavailable(format!("stored day '{name}' is not a weekday")))
        })
        .collect()
}

impl EntityStore for SqliteStore {
    fn save_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO customers (name, phone_number, notes) VALUES (?1, ?2, ?3)",
            params![customer.name, customer.phone_number, customer.notes],
        )?;
        Ok(customer.into_customer(conn.last_insert_rowid()))
    }

    fn find_customer(&self, id: Id) -> StoreResult<Customer> {
        let conn = self.lock()?;
        Self::load_customer(&conn, id)
    }

    fn all_customers(&self) -> StoreResult<Vec<Customer>> {
        let conn = self.lock()?;
        Self::ids(&conn, "SELECT id FROM customers ORDER BY id ASC", None)?
            .into_iter()
            .map(|id| Self::load_customer(&conn, id))
            .collect()
    }

    fn owner_of_pet(&self, pet_id: Id) -> StoreResult<Customer> {
        let conn = self.lock()?;
        let pet = Self::load_pet(&conn, pet_id)?;
        Self::load_customer(&conn, pet.owner_id)
    }

    fn save_pet(&self, pet: NewPet) -> StoreResult<Pet> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::require(&tx, EntityKind::Customer, pet.owner_id)?;
        tx.execute(
            "INSERT INTO pets (customer_id, pet_type, name, birth_date, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![pet.owner_id, pet.pet_type.as_str(), pet.name, pet.birth_date, pet.notes],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(pet.into_pet(id))
    }

    fn find_pet(&self, id: Id) -> StoreResult<Pet> {
        let conn = self.lock()?;
        Self::load_pet(&conn, id)
    }

    fn all_pets(&self) -> StoreResult<Vec<Pet>> {
        let conn = self.lock()?;
        Self::ids(&conn, "SELECT id FROM pets ORDER BY id ASC", None)?
            .into_iter()
            .map(|id| Self::load_pet(&conn, id))
            .collect()
    }

    fn pets_by_owner(&self, customer_id: Id) -> StoreResult<Vec<Pet>> {
        let conn = self.lock()?;
        Self::require(&conn, EntityKind::Customer, customer_id)?;
        Self::ids(
            &conn,
            "SELECT id FROM pets WHERE customer_id = ?1 ORDER BY id ASC",
            Some(customer_id),
        )?
        .into_iter()
        .map(|id| Self::load_pet(&conn, id))
        .collect()
    }

    fn save_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let conn = self.lock()?;
        let skills_json = serde_json::to_string(&employee.skills)?;
        let days_json = encode_days(&employee.days_available)?;
        conn.execute(
            "INSERT INTO employees (name, skills_json, days_json) VALUES (?1, ?2, ?3)",
            params![employee.name, skills_json, days_json],
        )?;
        Ok(employee.into_employee(conn.last_insert_rowid()))
    }

    fn find_employee(&self, id: Id) -> StoreResult<Employee> {
        let conn = self.lock()?;
        Self::load_employee(&conn, id)
    }

    fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        let conn = self.lock()?;
        Self::ids(&conn, "SELECT id FROM employees ORDER BY id ASC", None)?
            .into_iter()
            .map(|id| Self::load_employee(&conn, id))
            .collect()
    }

    fn update_employee_availability(
        &self,
        id: Id,
        days: HashSet<Weekday>,
    ) -> StoreResult<Employee> {
        self.update_employee_column(id, "days_json", encode_days(&days)?)
    }

    fn update_employee_skills(
        &self,
        id: Id,
        skills: BTreeSet<EmployeeSkill>,
    ) -> StoreResult<Employee> {
        self.update_employee_column(id, "skills_json", serde_json::to_string(&skills)?)
    }

    fn save_schedule(&self, schedule: NewSchedule) -> StoreResult<Schedule> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for pet_id in &schedule.pet_ids {
            Self::require(&tx, EntityKind::Pet, *pet_id)?;
        }
        for employee_id in &schedule.employee_ids {
            Self::require(&tx, EntityKind::Employee, *employee_id)?;
        }
        tx.execute(
            "INSERT INTO schedules (date, activities_json) VALUES (?1, ?2)",
            params![schedule.date, serde_json::to_string(&schedule.activities)?],
        )?;
        let id = tx.last_insert_rowid();
        Self::insert_links(&tx, "employee_scheduled", "employee_id", id, &schedule.employee_ids)?;
        Self::insert_links(&tx, "pet_scheduled", "pet_id", id, &schedule.pet_ids)?;
        tx.commit()?;
        Ok(schedule.into_schedule(id))
    }

    fn find_schedule(&self, id: Id) -> StoreResult<Schedule> {
        let conn = self.lock()?;
        Self::load_schedule(&conn, id)
    }

    fn all_schedules(&self) -> StoreResult<Vec<Schedule>> {
        let conn = self.lock()?;
        Self::ids(&conn, "SELECT id FROM schedules ORDER BY id ASC", None)?
            .into_iter()
            .map(|id| Self::load_schedule(&conn, id))
            .collect()
    }

    fn schedules_by_employee(&self, employee_id: Id) -> StoreResult<Vec<Schedule>> {
        self.schedules_linked_by(EntityKind::Employee, "employee_scheduled", "employee_id", employee_id)
    }

    fn schedules_by_pet(&self, pet_id: Id) -> StoreResult<Vec<Schedule>> {
        self.schedules_linked_by(EntityKind::Pet, "pet_scheduled", "pet_id", pet_id)
    }
}
