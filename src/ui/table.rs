use tabled::{settings::Style, Table, Tabled};

use crate::model::{Project, Service, Stat};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[Stat]) -> String {
    let mut builder = TableBuilder::new();
    for stat in stats {
        builder.add_row(&stat.label, &stat.value);
    }
    builder.build()
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Tech")]
    tech: String,
    #[tabled(rename = "Featured")]
    featured: String,
}

pub fn projects_table(projects: &[Project]) -> String {
    let rows: Vec<ProjectRow> = projects
        .iter()
        .map(|p| ProjectRow {
            id: p.id.to_string(),
            title: p.title.clone(),
            tech: p.tech_stack.join(", "),
            featured: if p.featured { "yes".into() } else { String::new() },
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

pub fn services_table(services: &[Service]) -> String {
    let rows: Vec<ServiceRow> = services
        .iter()
        .map(|s| ServiceRow {
            id: s.id.to_string(),
            title: s.title.clone(),
            description: truncate(&s.description, 60),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
