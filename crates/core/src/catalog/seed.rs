//! Default categories and sample resources for a fresh database.

use serde::Serialize;
use tokio_rusqlite::rusqlite::types::Value;

use super::Catalog;
use super::tags;
use crate::Error;
use crate::executor::TransactionScope;
use crate::store::row::column_i64;

/// `(name, description, icon)`, in display order.
const DEFAULT_CATEGORIES: [(&str, &str, &str); 15] = [
    ("Developer Tools", "Programming and development tools", "🛠️"),
    ("Design Assets", "Design materials and resources", "🎨"),
    ("Office", "Office and productivity software", "📊"),
    ("Learning", "Tutorials, documentation and courses", "📚"),
    ("Multimedia", "Audio and video tools", "🎵"),
    ("System", "System administration and tuning", "⚙️"),
    ("Data Analysis", "Data analysis and processing", "📈"),
    ("Files", "File management and conversion", "📁"),
    ("Text", "Text editing and processing", "📝"),
    ("Time", "Time management and scheduling", "⏰"),
    ("Everyday", "Everyday utilities", "🏠"),
    ("Network", "Network testing and management", "🌐"),
    ("Calculation", "Calculators and math tools", "🧮"),
    ("Creative", "Design and creative tools", "🎭"),
    ("General", "Other general-purpose utilities", "🔧"),
];

struct SampleResource {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    file_type: &'static str,
    file_size: i64,
    original_filename: &'static str,
    download_url: &'static str,
    download_password: Option<&'static str>,
    tags: [&'static str; 3],
}

const SAMPLE_RESOURCES: [SampleResource; 5] = [
    SampleResource {
        title: "Visual Studio Code",
        description: "Free code editor from Microsoft with support for many languages",
        category: "Developer Tools",
        file_type: "exe",
        file_size: 85_000_000,
        original_filename: "vscode-setup.exe",
        download_url: "https://code.visualstudio.com/download",
        download_password: None,
        tags: ["editor", "development", "free"],
    },
    SampleResource {
        title: "Photoshop 2024",
        description: "Professional image editor",
        category: "Design Assets",
        file_type: "exe",
        file_size: 2_500_000_000,
        original_filename: "photoshop-2024.exe",
        download_url: "https://example.com/ps2024",
        download_password: Some("abc123"),
        tags: ["image editing", "design", "Adobe"],
    },
    SampleResource {
        title: "Microsoft Office 365",
        description: "Microsoft office suite",
        category: "Office",
        file_type: "exe",
        file_size: 3_200_000_000,
        original_filename: "office365-setup.exe",
        download_url: "https://example.com/office365",
        download_password: Some("def456"),
        tags: ["office", "documents", "spreadsheets"],
    },
    SampleResource {
        title: "React Tutorial",
        description: "Complete guide to frontend development with React",
        category: "Learning",
        file_type: "pdf",
        file_size: 15_000_000,
        original_filename: "react-tutorial.pdf",
        download_url: "https://example.com/react-tutorial",
        download_password: None,
        tags: ["React", "frontend", "tutorial"],
    },
    SampleResource {
        title: "Audacity",
        description: "Free audio editor",
        category: "Multimedia",
        file_type: "exe",
        file_size: 45_000_000,
        original_filename: "audacity-setup.exe",
        download_url: "https://audacityteam.org/download/",
        download_password: None,
        tags: ["audio", "editing", "free"],
    },
];

/// Rows inserted by [`Catalog::seed_defaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub categories: usize,
    pub resources: usize,
}

fn table_is_empty(tx: &TransactionScope<'_>, table: &str) -> Result<bool, Error> {
    let rows = tx.fetch_all(&format!("SELECT COUNT(*) AS total FROM {table}"), &[])?;
    match rows.first() {
        Some(row) => Ok(column_i64(row, "total")? == 0),
        None => Ok(true),
    }
}

fn category_id(tx: &TransactionScope<'_>, name: &str) -> Result<Value, Error> {
    let rows = tx.fetch_all(
        "SELECT id FROM categories WHERE name = ? ORDER BY id LIMIT 1",
        &[Value::Text(name.to_string())],
    )?;
    match rows.first() {
        Some(row) => Ok(Value::Integer(column_i64(row, "id")?)),
        None => Ok(Value::Null),
    }
}

impl Catalog {
    /// Populate empty tables with the default categories and sample resources.
    ///
    /// Each table is seeded only when it has no rows at all, so reopening an
    /// existing database inserts nothing. Both inserts run in one transaction.
    pub async fn seed_defaults(&self) -> Result<SeedReport, Error> {
        let report = self
            .executor
            .run_in_transaction(|tx| {
                let mut report = SeedReport::default();

                if table_is_empty(tx, "categories")? {
                    for (position, (name, description, icon)) in DEFAULT_CATEGORIES.iter().enumerate() {
                        tx.run(
                            "INSERT INTO categories (name, description, icon, sort_order) VALUES (?, ?, ?, ?)",
                            &[
                                Value::Text((*name).into()),
                                Value::Text((*description).into()),
                                Value::Text((*icon).into()),
                                Value::Integer(position as i64 + 1),
                            ],
                        )?;
                        report.categories += 1;
                    }
                }

                if table_is_empty(tx, "resources")? {
                    for sample in &SAMPLE_RESOURCES {
                        let tags = tags::encode(&sample.tags.map(String::from))?;
                        tx.run(
                            "INSERT INTO resources (title, description, category_id, file_type, file_size, \
                             original_filename, download_url, download_password, tags) \
                             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                            &[
                                Value::Text(sample.title.into()),
                                Value::Text(sample.description.into()),
                                category_id(tx, sample.category)?,
                                Value::Text(sample.file_type.into()),
                                Value::Integer(sample.file_size),
                                Value::Text(sample.original_filename.into()),
                                Value::Text(sample.download_url.into()),
                                sample.download_password.map(String::from).into(),
                                Value::Text(tags),
                            ],
                        )?;
                        report.resources += 1;
                    }
                }

                Ok(report)
            })
            .await?;

        if report != SeedReport::default() {
            tracing::info!(categories = report.categories, resources = report.resources, "seeded default data");
        }
        Ok(report)
    }
}
