use serde::{Deserialize, Serialize};

use super::record::{take_number, take_text, FieldSpec, FieldValue, Record, Schema};

pub const PROJECT_STATUSES: &[&str] = &["planning", "active", "on_hold", "completed"];
pub const TASK_STATUSES: &[&str] = &["todo", "in_progress", "done"];
pub const TASK_PRIORITIES: &[&str] = &["low", "medium", "high"];

/// Label shown for a task whose project no longer exists.
pub const UNKNOWN_PROJECT: &str = "Unknown project";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub client: String,
    pub status: String,
    pub budget: f64,
    pub start_date: String,
    pub due_date: String,
    pub description: String,
}

static PROJECT_FIELDS: [FieldSpec; 7] = [
    FieldSpec::text("name", "Project Name").required(),
    FieldSpec::text("client", "Client"),
    FieldSpec::choice("status", "Status", PROJECT_STATUSES).required(),
    FieldSpec::number("budget", "Budget"),
    FieldSpec::date("startDate", "Start Date"),
    FieldSpec::date("dueDate", "Due Date"),
    FieldSpec::text("description", "Description"),
];

static PROJECT_SCHEMA: Schema = Schema {
    entity: "project",
    storage_key: "pm_projects",
    id_prefix: "prj",
    fields: &PROJECT_FIELDS,
    search_fields: &["name", "client", "description"],
    filter_field: Some("status"),
    list_columns: &["name", "client", "status", "budget", "dueDate"],
    paginated: false,
};

impl Record for Project {
    fn schema() -> &'static Schema {
        &PROJECT_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => FieldValue::text(&self.id),
            "name" => FieldValue::text(&self.name),
            "client" => FieldValue::text(&self.client),
            "status" => FieldValue::text(&self.status),
            "budget" => FieldValue::Number(self.budget),
            "startDate" => FieldValue::text(&self.start_date),
            "dueDate" => FieldValue::text(&self.due_date),
            "description" => FieldValue::text(&self.description),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: FieldValue) -> bool {
        match field {
            "name" => take_text(&mut self.name, value),
            "client" => take_text(&mut self.client, value),
            "status" => take_text(&mut self.status, value),
            "budget" => take_number(&mut self.budget, value),
            "startDate" => take_text(&mut self.start_date, value),
            "dueDate" => take_text(&mut self.due_date, value),
            "description" => take_text(&mut self.description, value),
            _ => false,
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            Project {
                id: "prj-1".to_string(),
                name: "Website Redesign".to_string(),
                client: "Acme Corp".to_string(),
                status: "active".to_string(),
                budget: 45000.0,
                start_date: "2024-01-15".to_string(),
                due_date: "2024-06-30".to_string(),
                description: "Full refresh of the marketing site".to_string(),
            },
            Project {
                id: "prj-2".to_string(),
                name: "Mobile App".to_string(),
                client: "Globex".to_string(),
                status: "planning".to_string(),
                budget: 120000.0,
                start_date: "2024-03-01".to_string(),
                due_date: "2024-12-15".to_string(),
                description: "Customer self-service app".to_string(),
            },
            Project {
                id: "prj-3".to_string(),
                name: "Data Warehouse".to_string(),
                client: "Initech".to_string(),
                status: "completed".to_string(),
                budget: 80000.0,
                start_date: "2023-05-01".to_string(),
                due_date: "2023-11-30".to_string(),
                description: "Consolidated reporting pipeline".to_string(),
            },
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub assignee: String,
    pub status: String,
    pub priority: String,
    pub due_date: String,
    pub hours: f64,
}

impl Task {
    /// Name of the owning project, or [`UNKNOWN_PROJECT`] when it no longer exists.
    pub fn project_label<'a>(&self, projects: &'a [Project]) -> &'a str {
        projects
            .iter()
            .find(|project| project.id == self.project_id)
            .map(|project| project.name.as_str())
            .unwrap_or(UNKNOWN_PROJECT)
    }
}

static TASK_FIELDS: [FieldSpec; 7] = [
    FieldSpec::text("projectId", "Project").required(),
    FieldSpec::text("title", "Task Title").required(),
    FieldSpec::text("assignee", "Assignee"),
    FieldSpec::choice("status", "Status", TASK_STATUSES).required(),
    FieldSpec::choice("priority", "Priority", TASK_PRIORITIES),
    FieldSpec::date("dueDate", "Due Date"),
    FieldSpec::number("hours", "Estimated Hours"),
];

static TASK_SCHEMA: Schema = Schema {
    entity: "task",
    storage_key: "pm_tasks",
    id_prefix: "tsk",
    fields: &TASK_FIELDS,
    search_fields: &["title", "assignee"],
    filter_field: Some("status"),
    list_columns: &["title", "projectId", "assignee", "status", "priority", "dueDate"],
    paginated: false,
};

impl Record for Task {
    fn schema() -> &'static Schema {
        &TASK_SCHEMA
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => FieldValue::text(&self.id),
            "projectId" => FieldValue::text(&self.project_id),
            "title" => FieldValue::text(&self.title),
            "assignee" => FieldValue::text(&self.assignee),
            "status" => FieldValue::text(&self.status),
            "priority" => FieldValue::text(&self.priority),
            "dueDate" => FieldValue::text(&self.due_date),
            "hours" => FieldValue::Number(self.hours),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: FieldValue) -> bool {
        match field {
            "projectId" => take_text(&mut self.project_id, value),
            "title" => take_text(&mut self.title, value),
            "assignee" => take_text(&mut self.assignee, value),
            "status" => take_text(&mut self.status, value),
            "priority" => take_text(&mut self.priority, value),
            "dueDate" => take_text(&mut self.due_date, value),
            "hours" => take_number(&mut self.hours, value),
            _ => false,
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            Task {
                id: "tsk-1".to_string(),
                project_id: "prj-1".to_string(),
                title: "Wireframes".to_string(),
                assignee: "Dana".to_string(),
                status: "done".to_string(),
                priority: "high".to_string(),
                due_date: "2024-02-15".to_string(),
                hours: 24.0,
            },
            Task {
                id: "tsk-2".to_string(),
                project_id: "prj-1".to_string(),
                title: "Content migration".to_string(),
                assignee: "Lee".to_string(),
                status: "in_progress".to_string(),
                priority: "medium".to_string(),
                due_date: "2024-05-01".to_string(),
                hours: 40.0,
            },
            Task {
                id: "tsk-3".to_string(),
                project_id: "prj-2".to_string(),
                title: "API contract".to_string(),
                assignee: "Sam".to_string(),
                status: "todo".to_string(),
                priority: "high".to_string(),
                due_date: "2024-04-01".to_string(),
                hours: 16.0,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{Project, Task, UNKNOWN_PROJECT};
    use crate::domain::record::Record;

    #[test]
    fn task_label_falls_back_for_orphans() {
        let projects = Project::seed();
        let mut task = Task::seed().remove(0);
        assert_eq!(task.project_label(&projects), "Website Redesign");

        task.project_id = "prj-gone".to_string();
        assert_eq!(task.project_label(&projects), UNKNOWN_PROJECT);
    }

    #[test]
    fn seeded_tasks_reference_seeded_projects() {
        let projects = Project::seed();
        for task in Task::seed() {
            assert!(projects.iter().any(|project| project.id == task.project_id));
        }
    }
}
