use crate::table::render_text_table;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use critter_core::model::weekdays;
use critter_core::{
    Customer, DaycareService, Employee, EmployeeSkill, Id, MemoryStore, NewCustomer, NewEmployee,
    NewPet, Pet, PetType, Schedule, export_schedules_to_csv, load_snapshot_from_json,
    save_snapshot_to_json,
};
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

const HELP: &str = "Commands:
  help                                       Show this help
  customer add <phone> <name...>             Register a customer
  customers                                  List customers
  pet add <owner_id> <type> <name...>        Register a pet for a customer
  pets [owner_id]                            List pets, optionally by owner
  employee add <name> <skills_csv> [days_csv]
                                             Register an employee
  employees                                  List employees
  availability <employee_id> <days_csv>      Replace an employee's days
  skills <employee_id> <skills_csv>          Replace an employee's skills
  find <skills_csv|-> <YYYY-MM-DD>           Employees able to work that day
  schedule add <YYYY-MM-DD> <pet_ids_csv> <employee_ids_csv> <activities_csv>
                                             Book pets and employees
  schedules [employee|pet|customer <id>]     List schedules
  export csv <path>                          Write all schedules as CSV
  save json <path>                           Snapshot the in-memory store
  load json <path>                           Replace the in-memory store
  quit|exit                                  Exit";

enum Reply {
    Text(String),
    Quit,
}

/// Line-oriented shell over a [`DaycareService`].
///
/// Snapshot commands need direct access to the in-memory store, so the
/// console keeps a handle to it when the service was built on one.
pub struct Console {
    service: DaycareService,
    memory: Option<Arc<MemoryStore>>,
}

impl Console {
    pub fn new(service: DaycareService) -> Self {
        Self {
            service,
            memory: None,
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            service: DaycareService::new(store.clone()),
            memory: Some(store),
        }
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "Critter daycare shell - type 'help' for commands\n")?;
        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next() else { break };
            let line = line?;
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            match self.execute(input) {
                Ok(Reply::Text(text)) => writeln!(out, "{text}")?,
                Ok(Reply::Quit) => break,
                Err(err) => writeln!(out, "Error: {err:#}")?,
            }
        }
        Ok(())
    }

    fn execute(&mut self, input: &str) -> Result<Reply> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let text = match parts.as_slice() {
            ["help"] => HELP.to_string(),
            ["quit"] | ["exit"] => return Ok(Reply::Quit),
            ["customer", "add", phone, name @ ..] if !name.is_empty() => {
                let saved = self
                    .service
                    .save_customer(NewCustomer::new(name.join(" "), *phone))?;
                format!("Customer {} saved.", saved.id)
            }
            ["customer", ..] => "Usage: customer add <phone> <name...>".to_string(),
            ["customers"] => customers_table(&self.service.all_customers()?),
            ["pet", "add", owner, kind, name @ ..] if !name.is_empty() => {
                let owner_id = parse_id(owner)?;
                let pet_type: PetType = kind.parse()?;
                let saved = self
                    .service
                    .save_pet(NewPet::new(pet_type, name.join(" "), owner_id))?;
                format!("Pet {} saved for customer {}.", saved.id, saved.owner_id)
            }
            ["pet", ..] => "Usage: pet add <owner_id> <type> <name...>".to_string(),
            ["pets"] => pets_table(&self.service.all_pets()?),
            ["pets", owner] => pets_table(&self.service.pets_by_owner(parse_id(owner)?)?),
            ["employee", "add", name, skills, rest @ ..] if rest.len() <= 1 => {
                let mut draft = NewEmployee::new(*name).with_skills(parse_skills(skills)?);
                if let Some(days) = rest.first() {
                    draft = draft.available_on(weekdays::parse_set(days)?);
                }
                let saved = self.service.save_employee(draft)?;
                format!("Employee {} saved.", saved.id)
            }
            ["employee", ..] => "Usage: employee add <name> <skills_csv> [days_csv]".to_string(),
            ["employees"] => employees_table(&self.service.all_employees()?),
            ["availability", id, days] => {
                let updated = self
                    .service
                    .set_availability(parse_id(id)?, weekdays::parse_set(days)?)?;
                format!("Employee {} availability set.", updated.id)
            }
            ["availability", ..] => "Usage: availability <employee_id> <days_csv>".to_string(),
            ["skills", id, skills] => {
                let updated = self.service.set_skills(parse_id(id)?, parse_skills(skills)?)?;
                format!("Employee {} skills set.", updated.id)
            }
            ["skills", ..] => "Usage: skills <employee_id> <skills_csv>".to_string(),
            ["find", skills, date] => {
                let found = self
                    .service
                    .find_qualified_employees(&parse_skills(skills)?, parse_date(date)?)?;
                employees_table(&found)
            }
            ["find", ..] => "Usage: find <skills_csv|-> <YYYY-MM-DD>".to_string(),
            ["schedule", "add", date, pets, employees, activities] => {
                let saved = self.service.create_schedule(
                    parse_ids(pets)?,
                    parse_ids(employees)?,
                    parse_date(date)?,
                    parse_skills(activities)?,
                )?;
                format!("Schedule {} created for {}.", saved.id, saved.date)
            }
            ["schedule", ..] => {
                "Usage: schedule add <YYYY-MM-DD> <pet_ids_csv> <employee_ids_csv> <activities_csv>"
                    .to_string()
            }
            ["schedules"] => schedules_table(&self.service.all_schedules()?),
            ["schedules", "employee", id] => {
                schedules_table(&self.service.schedules_for_employee(parse_id(id)?)?)
            }
            ["schedules", "pet", id] => {
                schedules_table(&self.service.schedules_for_pet(parse_id(id)?)?)
            }
            ["schedules", "customer", id] => {
                schedules_table(&self.service.schedules_for_customer(parse_id(id)?)?)
            }
            ["schedules", ..] => "Usage: schedules [employee|pet|customer <id>]".to_string(),
            ["export", "csv", path] => {
                let rows = export_schedules_to_csv(self.service.store(), path)?;
                format!("Exported {rows} schedules to {path}.")
            }
            ["save", "json", path] => {
                save_snapshot_to_json(self.memory_store()?, path)?;
                format!("Saved snapshot to {path}.")
            }
            ["load", "json", path] => {
                self.memory_store()?;
                let store = Arc::new(load_snapshot_from_json(path)?);
                *self = Console::in_memory(store);
                format!("Loaded snapshot from {path}.")
            }
            ["export", ..] => "Usage: export csv <path>".to_string(),
            ["save", ..] | ["load", ..] => "Usage: save json <path> | load json <path>".to_string(),
            _ => "Unknown command. Type 'help'.".to_string(),
        };
        Ok(Reply::Text(text))
    }

    fn memory_store(&self) -> Result<&MemoryStore> {
        self.memory
            .as_deref()
            .ok_or_else(|| anyhow!("snapshots are only available with the in-memory store"))
    }
}

fn parse_id(raw: &str) -> Result<Id> {
    raw.parse().with_context(|| format!("invalid id '{raw}'"))
}

fn parse_ids(raw: &str) -> Result<Vec<Id>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_id)
        .collect()
}

/// `-` stands for the empty set.
fn parse_skills(raw: &str) -> Result<BTreeSet<EmployeeSkill>> {
    if raw == "-" {
        return Ok(BTreeSet::new());
    }
    Ok(EmployeeSkill::parse_set(raw)?)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Ok(date),
        Err(_) => bail!("invalid date '{raw}' (YYYY-MM-DD)"),
    }
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn customers_table(customers: &[Customer]) -> String {
    let rows: Vec<Vec<String>> = customers
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.phone_number.clone(),
                join(&c.pet_ids),
            ]
        })
        .collect();
    render_text_table(&["id", "name", "phone", "pets"], &rows)
}

fn pets_table(pets: &[Pet]) -> String {
    let rows: Vec<Vec<String>> = pets
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.pet_type.to_string(),
                p.owner_id.to_string(),
            ]
        })
        .collect();
    render_text_table(&["id", "name", "type", "owner"], &rows)
}

fn employees_table(employees: &[Employee]) -> String {
    let rows: Vec<Vec<String>> = employees
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.name.clone(),
                join(&e.skills),
                join(
                    weekdays::sorted(&e.days_available)
                        .into_iter()
                        .map(weekdays::full_name),
                ),
            ]
        })
        .collect();
    render_text_table(&["id", "name", "skills", "days"], &rows)
}

fn schedules_table(schedules: &[Schedule]) -> String {
    let rows: Vec<Vec<String>> = schedules
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.date.to_string(),
                join(&s.pet_ids),
                join(&s.employee_ids),
                join(&s.activities),
            ]
        })
        .collect();
    render_text_table(&["id", "date", "pets", "employees", "activities"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_script(console: &mut Console, script: &str) -> String {
        let mut out = Vec::new();
        console.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn books_and_lists_a_schedule() {
        let mut console = Console::in_memory(Arc::new(MemoryStore::new()));
        let out = run_script(
            &mut console,
            "customer add 555-0100 Jo Tester\n\
             pet add 1 dog Rex\n\
             employee add Sam walking,feeding mon,tue\n\
             find walking 2024-01-08\n\
             schedule add 2024-01-08 1 1 walking\n\
             schedules customer 1\n",
        );
        assert!(out.contains("Customer 1 saved."));
        assert!(out.contains("Pet 1 saved for customer 1."));
        assert!(out.contains("| 1  | Sam  | WALKING,FEEDING | MONDAY,TUESDAY |"));
        assert!(out.contains("Schedule 1 created for 2024-01-08."));
        assert!(out.contains("| 1  | 2024-01-08 | 1    | 1         | WALKING    |"));
    }

    #[test]
    fn reports_errors_and_keeps_going() {
        let mut console = Console::in_memory(Arc::new(MemoryStore::new()));
        let out = run_script(
            &mut console,
            "schedule add 2024-01-08 7 1 walking\nfrobnicate\npets abc\nquit\ncustomers\n",
        );
        assert!(out.contains("Error: pet 7 not found"));
        assert!(out.contains("Unknown command. Type 'help'."));
        assert!(out.contains("Error: invalid id 'abc'"));
        assert!(!out.contains("| id "));
    }

    #[test]
    fn snapshots_need_the_memory_store() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let mut console = Console::new(DaycareService::new(store));
        let out = run_script(&mut console, "save json /tmp/never-written.json\n");
        assert!(out.contains("Error: snapshots are only available with the in-memory store"));
    }
}
