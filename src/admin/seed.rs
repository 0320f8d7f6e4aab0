//! Starter content for an empty portfolio

use serde::Serialize;

use crate::Result;
use crate::data::DataService;
use crate::model::{Education, ProjectDraft, ServiceDraft, SkillCategory, Stat};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub projects: usize,
    pub services: usize,
    pub about_sections: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.projects == 0 && self.services == 0 && self.about_sections == 0
    }
}

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn default_projects() -> Vec<ProjectDraft> {
    vec![
        ProjectDraft {
            title: "REST API Service".into(),
            description: "A REST API with authentication, request validation, and a layered architecture.".into(),
            tech_stack: tags(&["Java", "Spring Boot", "REST API", "Maven"]),
            live_url: None,
            code_url: Some("https://github.com/example/rest-api".into()),
            featured: false,
        },
        ProjectDraft {
            title: "Business Plan Generator".into(),
            description: "A web application that drafts business plans from a short questionnaire.".into(),
            tech_stack: tags(&["Python", "Streamlit", "AI/ML", "NLP"]),
            live_url: Some("https://example.com/plan-generator".into()),
            code_url: Some("https://github.com/example/plan-generator".into()),
            featured: true,
        },
        ProjectDraft {
            title: "Calculator".into(),
            description: "A calculator with a clean interface and scientific operations.".into(),
            tech_stack: tags(&["HTML5", "CSS3", "JavaScript", "Responsive"]),
            live_url: None,
            code_url: Some("https://github.com/example/calculator".into()),
            featured: false,
        },
    ]
}

pub fn default_services() -> Vec<ServiceDraft> {
    [
        ("Image Editing", "Photo editing, retouching, background removal, and graphic design."),
        ("PDF Manipulation", "Merging, splitting, compression, conversion, and form creation."),
        ("Audio Editing", "Audio enhancement, noise reduction, mixing, and mastering."),
        ("Video & Audio Extraction", "Extract audio from video and convert between formats."),
        ("Web Development", "Custom web applications, responsive websites, and API development."),
        ("Custom Solutions", "Tailored digital solutions for specific needs."),
    ]
    .into_iter()
    .map(|(title, description)| ServiceDraft {
        title: title.into(),
        description: description.into(),
    })
    .collect()
}

pub const DEFAULT_JOURNEY: &str = "I'm a software engineering student who enjoys building things for the web.\n\n\
Along the way I've worked across the stack, with a particular interest in full-stack development, cloud platforms, and applied machine learning.";

pub fn default_stats() -> Vec<Stat> {
    [("3+", "Projects Completed"), ("10+", "Technologies"), ("2023", "Started College")]
        .into_iter()
        .map(|(value, label)| Stat {
            value: value.into(),
            label: label.into(),
        })
        .collect()
}

pub fn default_education() -> Vec<Education> {
    vec![
        Education {
            year: "2023 - Present".into(),
            title: "B.E. Computer Science Engineering".into(),
            institution: "College of Technology".into(),
            description: "Undergraduate degree focused on software development, algorithms, and web technologies.".into(),
        },
        Education {
            year: "2020 - 2023".into(),
            title: "Higher Secondary Education".into(),
            institution: "National Public School".into(),
            description: "Mathematics, Physics, and Computer Science.".into(),
        },
    ]
}

pub fn default_skills() -> Vec<SkillCategory> {
    [
        ("Programming Languages", &["C++", "Java", "JavaScript", "Python"][..]),
        ("Web Technologies", &["HTML5", "CSS3", "React", "REST API"][..]),
        ("Frameworks & Tools", &["Spring Boot", "Streamlit", "Docker", "AWS"][..]),
        ("Database & Others", &["DBMS", "Git", "AI/ML", "Data Structures"][..]),
    ]
    .into_iter()
    .map(|(name, skills)| SkillCategory {
        name: name.into(),
        skills: tags(skills),
    })
    .collect()
}

/// Fill whatever is empty with starter content. Existing content is never touched.
pub async fn seed_defaults(data: &DataService) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if data.list_projects().await?.is_empty() {
        for draft in default_projects() {
            data.save_project(draft, None).await?;
            report.projects += 1;
        }
    }

    if data.list_services().await?.is_empty() {
        for draft in default_services() {
            data.save_service(draft, None).await?;
            report.services += 1;
        }
    }

    let mut about = data.get_about().await?;
    if about.journey.trim().is_empty() {
        about.journey = DEFAULT_JOURNEY.to_string();
        report.about_sections += 1;
    }
    if about.stats.is_empty() {
        about.stats = default_stats();
        report.about_sections += 1;
    }
    if about.education.is_empty() {
        about.education = default_education();
        report.about_sections += 1;
    }
    if about.skills.is_empty() {
        about.skills = default_skills();
        report.about_sections += 1;
    }
    if report.about_sections > 0 {
        data.save_about(&about).await?;
    }

    tracing::info!(
        "Seeded {} projects, {} services, {} about sections",
        report.projects,
        report.services,
        report.about_sections
    );
    Ok(report)
}
