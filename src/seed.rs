//! Demo dataset used on first run, by `sd seed` and by `--demo`.
//!
//! Task deadlines are relative to `today` so the data always has something
//! overdue, something due today and something upcoming.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::db::Database;
use crate::fields::*;
use crate::notify::{default_rules, NotificationSettings, Reminder};
use crate::project::Project;
use crate::staff::{Department, Employee};
use crate::task::Task;

fn ts(y: i32, m: u32, d: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0)
        .single()
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

fn project(id: u64, parent_id: Option<u64>, name: &str, description: &str, color: &str, order: i32, created: i64) -> Project {
    Project {
        id,
        parent_id,
        name: name.into(),
        color: color.into(),
        description: description.into(),
        order,
        created_at_utc: created,
        updated_at_utc: created,
    }
}

fn projects() -> Vec<Project> {
    vec![
        project(1, None, "Acme Ltd", "Main client of the company", "#2180CE", 1, ts(2024, 1, 15)),
        project(2, None, "Sidorov Trading", "Sole proprietor", "#31A24C", 2, ts(2024, 1, 20)),
        project(3, None, "Internal", "Internal company work", "#F0AD4E", 3, ts(2024, 1, 25)),
        project(4, Some(1), "Company website", "Website development and support", "#2180CE", 1, ts(2024, 2, 1)),
        project(5, Some(1), "Mobile app", "iOS and Android application", "#2180CE", 2, ts(2024, 2, 5)),
        project(6, Some(1), "CRM rollout", "CRM implementation", "#2180CE", 3, ts(2024, 2, 10)),
        project(7, Some(4), "Home page redesign", "Refresh of the landing page", "#17A2B8", 1, ts(2024, 2, 15)),
        project(8, Some(4), "SEO", "Search engine optimisation", "#17A2B8", 2, ts(2024, 2, 20)),
        project(9, Some(2), "Online store", "Store development", "#31A24C", 1, ts(2024, 3, 1)),
        project(10, Some(3), "Automation", "Internal tooling", "#F0AD4E", 1, ts(2024, 3, 5)),
        project(11, Some(3), "Documentation", "Keeping the docs current", "#F0AD4E", 2, ts(2024, 3, 10)),
    ]
}

fn departments() -> Vec<Department> {
    let created = ts(2024, 1, 10);
    [
        (1, "Development", "Backend and frontend", 1),
        (2, "Design", "UI/UX design", 4),
        (3, "Marketing", "Promotion and advertising", 6),
        (4, "Sales", "Client relations", 8),
    ]
    .into_iter()
    .map(|(id, name, description, manager)| Department {
        id,
        name: name.into(),
        description: description.into(),
        manager_id: Some(manager),
        order: id as i32,
        created_at_utc: created,
        updated_at_utc: created,
    })
    .collect()
}

fn employees() -> Vec<Employee> {
    [
        (1, 1, "Ivan", "Petrov", "Team Lead", "+7 (999) 123-45-67", 10),
        (2, 1, "Maria", "Sidorova", "Senior Developer", "+7 (999) 234-56-78", 10),
        (3, 1, "Alexey", "Kozlov", "Middle Developer", "+7 (999) 345-67-89", 15),
        (4, 2, "Elena", "Volkova", "Lead Designer", "+7 (999) 456-78-90", 10),
        (5, 2, "Dmitry", "Novikov", "UI Designer", "+7 (999) 567-89-01", 12),
        (6, 3, "Olga", "Morozova", "Marketing Manager", "+7 (999) 678-90-12", 10),
        (7, 3, "Sergey", "Belov", "SMM Specialist", "+7 (999) 789-01-23", 14),
        (8, 4, "Anna", "Kuznetsova", "Sales Manager", "+7 (999) 890-12-34", 10),
        (9, 4, "Pavel", "Smirnov", "Account Manager", "+7 (999) 901-23-45", 16),
        (10, 4, "Natalia", "Fedorova", "Sales Representative", "+7 (999) 012-34-56", 18),
    ]
    .into_iter()
    .map(|(id, department_id, first, last, position, phone, day)| Employee {
        id,
        department_id,
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@company.example", first.to_lowercase(), last.to_lowercase()),
        phone: Some(phone.into()),
        position: position.into(),
        is_active: id != 10,
        created_at_utc: ts(2024, 1, day),
        updated_at_utc: if id == 10 { ts(2024, 2, 20) } else { ts(2024, 1, day) },
    })
    .collect()
}

struct TaskSeed {
    id: u64,
    title: &'static str,
    description: &'static str,
    project_ids: &'static [u64],
    assignee_ids: &'static [u64],
    days: i64,
    time: (u32, u32),
    status: TaskStatus,
    priority: Priority,
    created: (u32, u32),
}

const TASKS: [TaskSeed; 8] = [
    TaskSeed {
        id: 1,
        title: "Build the authorization module",
        description: "Add OAuth 2.0 to the mobile app, including Google and Apple ID sign-in.",
        project_ids: &[5],
        assignee_ids: &[1, 2],
        days: 3,
        time: (14, 0),
        status: TaskStatus::InProgress,
        priority: Priority::High,
        created: (1, 20),
    },
    TaskSeed {
        id: 2,
        title: "Draft mockups of the new home page",
        description: "Three design options for the client to choose from.",
        project_ids: &[7],
        assignee_ids: &[4, 5],
        days: 5,
        time: (12, 0),
        status: TaskStatus::Pending,
        priority: Priority::Normal,
        created: (1, 22),
    },
    TaskSeed {
        id: 3,
        title: "Set up SEO meta tags",
        description: "Add and tune meta tags on every page of the site.",
        project_ids: &[8],
        assignee_ids: &[2, 7],
        days: -2,
        time: (10, 0),
        status: TaskStatus::InProgress,
        priority: Priority::Urgent,
        created: (1, 18),
    },
    TaskSeed {
        id: 4,
        title: "Test the online store",
        description: "Full functional pass over cart, payment and delivery.",
        project_ids: &[9],
        assignee_ids: &[3],
        days: 10,
        time: (16, 0),
        status: TaskStatus::Pending,
        priority: Priority::Normal,
        created: (1, 25),
    },
    TaskSeed {
        id: 5,
        title: "Prepare the ad campaign",
        description: "Creatives and targeting for the social media launch.",
        project_ids: &[1, 4],
        assignee_ids: &[6, 7],
        days: 7,
        time: (11, 0),
        status: TaskStatus::Pending,
        priority: Priority::High,
        created: (1, 26),
    },
    TaskSeed {
        id: 6,
        title: "Update the API documentation",
        description: "Bring the docs for every endpoint up to date.",
        project_ids: &[11],
        assignee_ids: &[1, 3],
        days: -5,
        time: (9, 0),
        status: TaskStatus::Completed,
        priority: Priority::Low,
        created: (1, 15),
    },
    TaskSeed {
        id: 7,
        title: "Meet the client",
        description: "Discuss requirements for the new CRM features.",
        project_ids: &[6],
        assignee_ids: &[8, 9],
        days: 0,
        time: (15, 0),
        status: TaskStatus::InProgress,
        priority: Priority::High,
        created: (1, 28),
    },
    TaskSeed {
        id: 8,
        title: "Fix the cart discount bug",
        description: "Discount is miscalculated with more than 10 items in the cart.",
        project_ids: &[9],
        assignee_ids: &[2],
        days: 1,
        time: (10, 0),
        status: TaskStatus::Pending,
        priority: Priority::Urgent,
        created: (1, 29),
    },
];

fn tasks(today: NaiveDate, noon: i64) -> Vec<Task> {
    const DAY: i64 = 24 * 60 * 60;
    TASKS
        .iter()
        .map(|s| {
            let created = ts(2024, s.created.0, s.created.1);
            let terminal = s.status.is_terminal();
            Task {
                id: s.id,
                title: s.title.into(),
                description: s.description.into(),
                project_ids: s.project_ids.to_vec(),
                assignee_ids: s.assignee_ids.to_vec(),
                creator_id: Some(1),
                status: s.status,
                priority: s.priority,
                scheduled_date: today + Duration::days(s.days),
                scheduled_time: NaiveTime::from_hms_opt(s.time.0, s.time.1, 0).unwrap_or(NaiveTime::MIN),
                reminders_enabled: !terminal,
                last_reminder_utc: match s.id {
                    3 => Some(noon - DAY),
                    7 => Some(noon - 2 * 60 * 60),
                    _ => None,
                },
                next_reminder_utc: if terminal || s.id == 7 { None } else { Some(noon + DAY) },
                completed_at_utc: terminal.then_some(noon - 3 * DAY),
                created_at_utc: created,
                updated_at_utc: created,
            }
        })
        .collect()
}

fn reminders(noon: i64) -> Vec<Reminder> {
    [(1, 3, 2, noon - 24 * 60 * 60), (2, 7, 8, noon - 2 * 60 * 60)]
        .into_iter()
        .map(|(id, task_id, employee_id, at)| Reminder {
            id,
            task_id,
            employee_id,
            channel: Channel::Email,
            status: DeliveryStatus::Sent,
            sent_at_utc: Some(at),
            error_message: None,
            created_at_utc: at,
        })
        .collect()
}

/// Build the demo dataset with deadlines around `today`.
pub fn demo_database(today: NaiveDate) -> Database {
    let noon = today
        .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN))
        .and_utc()
        .timestamp();
    Database {
        tasks: tasks(today, noon),
        projects: projects(),
        departments: departments(),
        employees: employees(),
        reminders: reminders(noon),
        settings: NotificationSettings {
            emails: vec!["admin@company.example".into()],
            ..NotificationSettings::default()
        },
        rules: default_rules(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ProjectTree;

    #[test]
    fn test_demo_data_is_consistent() {
        let db = demo_database(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        let tree = ProjectTree::new(&db.projects);
        assert_eq!(tree.roots(), &[1, 2, 3]);
        for t in &db.tasks {
            assert!(t.project_ids.iter().all(|p| db.project(*p).is_some()), "task {}", t.id);
            assert!(t.assignee_ids.iter().all(|e| db.employee(*e).is_some()), "task {}", t.id);
        }
        for e in &db.employees {
            assert!(db.department(e.department_id).is_some());
        }
        assert_eq!(db.active_members(4), vec![8, 9]);
    }
}
