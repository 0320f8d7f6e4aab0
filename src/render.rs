//! Page rendering
//!
//! Public pages are static HTML templates with marked regions:
//!
//! ```html
//! <div class="projects-grid"><!-- folio:projects -->
//!   ...static fallback cards...
//! <!-- /folio:projects --></div>
//! ```
//!
//! [`render_page`] swaps a region's inner markup for generated markup when
//! there is data for it. Empty data leaves the static fallback in place.

use std::fmt::Write;

use crate::data::DataService;
use crate::model::{AboutContent, Project, Service};

/// Which public page a request is for, from the last path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageId {
    Home,
    Projects,
    Services,
    About,
    Other,
}

impl PageId {
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.rsplit('/').next().unwrap_or_default() {
            "" | "index.html" => PageId::Home,
            "projects.html" => PageId::Projects,
            "services.html" => PageId::Services,
            "about.html" => PageId::About,
            _ => PageId::Other,
        }
    }

    /// Template file backing the page
    pub fn template(self) -> Option<&'static str> {
        match self {
            PageId::Home => Some("index.html"),
            PageId::Projects => Some("projects.html"),
            PageId::Services => Some("services.html"),
            PageId::About => Some("about.html"),
            PageId::Other => None,
        }
    }

    fn shows_photo(self) -> bool {
        matches!(self, PageId::Home | PageId::About)
    }
}

/// Records a page needs, fetched up front
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub projects: Vec<Project>,
    pub services: Vec<Service>,
    pub about: AboutContent,
}

impl PageData {
    /// Fetch only what `page` renders. A failed fetch renders as empty.
    pub async fn load(page: PageId, data: &DataService) -> Self {
        let mut page_data = PageData::default();

        if page.shows_photo() {
            match data.get_about().await {
                Ok(about) => page_data.about = about,
                Err(e) => tracing::error!("Error loading about data: {}", e),
            }
        }

        match page {
            PageId::Projects => match data.list_projects().await {
                Ok(projects) => page_data.projects = projects,
                Err(e) => tracing::error!("Error loading projects: {}", e),
            },
            PageId::Services => match data.list_services().await {
                Ok(services) => page_data.services = services,
                Err(e) => tracing::error!("Error loading services: {}", e),
            },
            _ => {}
        }

        page_data
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Replace the inner markup of every `region` marker pair in `html`
pub fn replace_region(html: &str, region: &str, inner: &str) -> String {
    let open = format!("<!-- folio:{region} -->");
    let close = format!("<!-- /folio:{region} -->");

    let mut out = String::with_capacity(html.len() + inner.len());
    let mut rest = html;
    while let Some(start) = rest.find(&open) {
        let body_start = start + open.len();
        let Some(len) = rest[body_start..].find(&close) else {
            break;
        };
        out.push_str(&rest[..body_start]);
        out.push('\n');
        out.push_str(inner);
        out.push('\n');
        out.push_str(&close);
        rest = &rest[body_start + len + close.len()..];
    }
    out.push_str(rest);
    out
}

/// Fill `template` with `data` for `page`
pub fn render_page(page: PageId, template: &str, data: &PageData) -> String {
    let mut html = template.to_string();

    if page.shows_photo() {
        if let Some(url) = data.about.photo_url() {
            html = replace_region(&html, "hero-photo", &hero_photo(url));
            html = replace_region(&html, "profile-photo", &profile_photo(url));
        }
    }

    match page {
        PageId::Projects if !data.projects.is_empty() => {
            html = replace_region(&html, "projects", &projects_markup(&data.projects));
        }
        PageId::Services if !data.services.is_empty() => {
            html = replace_region(&html, "services", &services_markup(&data.services));
        }
        PageId::About => html = render_about(html, &data.about),
        _ => {}
    }

    html
}

fn render_about(mut html: String, about: &AboutContent) -> String {
    if !about.journey.trim().is_empty() {
        html = replace_region(&html, "journey", &journey_markup(&about.journey));
    }
    if !about.stats.is_empty() {
        html = replace_region(&html, "stats", &stats_markup(about));
    }
    if !about.education.is_empty() {
        html = replace_region(&html, "education", &education_markup(about));
    }
    if !about.skills.is_empty() {
        html = replace_region(&html, "skills", &skills_markup(about));
    }
    html
}

// ========== Markup ==========

fn hero_photo(url: &str) -> String {
    format!(
        r#"<div class="hero-photo" id="heroPhotoContainer"><img id="heroPhoto" src="{}" alt="Profile photo"></div>"#,
        escape_html(url)
    )
}

fn profile_photo(url: &str) -> String {
    format!(
        r#"<div class="profile-photo" id="profilePhotoContainer"><img id="profilePhoto" src="{}" alt="Profile photo"></div>"#,
        escape_html(url)
    )
}

fn projects_markup(projects: &[Project]) -> String {
    let mut out = String::new();
    for project in projects {
        let class = if project.featured { "project-card featured" } else { "project-card" };
        let _ = writeln!(out, r#"<div class="{class}">"#);
        out.push_str("  <div class=\"project-content\">\n");
        let _ = writeln!(out, "    <h3>{}</h3>", escape_html(&project.title));
        let _ = writeln!(
            out,
            r#"    <p class="project-description">{}</p>"#,
            escape_html(&project.description)
        );
        out.push_str("    <div class=\"tech-stack\">");
        for tech in &project.tech_stack {
            let _ = write!(out, r#"<span class="tech-tag">{}</span>"#, escape_html(tech));
        }
        out.push_str("</div>\n    <div class=\"project-links\">");
        if let Some(url) = project.live_url.as_deref().filter(|u| !u.is_empty()) {
            let _ = write!(
                out,
                r#"<a href="{}" target="_blank" class="btn btn-primary">Live Demo</a>"#,
                escape_html(url)
            );
        }
        if let Some(url) = project.code_url.as_deref().filter(|u| !u.is_empty()) {
            let _ = write!(
                out,
                r#"<a href="{}" target="_blank" class="btn btn-secondary">View Code</a>"#,
                escape_html(url)
            );
        }
        out.push_str("</div>\n  </div>\n</div>\n");
    }
    out.trim_end().to_string()
}

const SERVICE_ICONS: [&str; 6] = [
    r#"<svg width="48" height="48" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><rect x="3" y="3" width="18" height="18" rx="2" ry="2"/><circle cx="9" cy="9" r="2"/><path d="m21 15-3.086-3.086a2 2 0 0 0-2.828 0L6 21"/></svg>"#,
    r#"<svg width="48" height="48" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M14 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V8z"/><polyline points="14,2 14,8 20,8"/><line x1="16" y1="13" x2="8" y2="13"/><line x1="16" y1="17" x2="8" y2="17"/><polyline points="10,9 9,9 8,9"/></svg>"#,
    r#"<svg width="48" height="48" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><polygon points="11 5 6 9 2 9 2 15 6 15 11 19 11 5"/><path d="m19.07 4.93-1.41 1.41A10 10 0 0 1 19.07 19.07l1.41 1.41A12 12 0 0 0 19.07 4.93z"/><path d="m15.54 8.46-1.41 1.41a4 4 0 0 1 0 4.24l1.41 1.41a6 6 0 0 0 0-7.06z"/></svg>"#,
    r#"<svg width="48" height="48" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><polygon points="23 7 16 12 23 17 23 7"/><rect x="1" y="5" width="15" height="14" rx="2" ry="2"/></svg>"#,
    r#"<svg width="48" height="48" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><polyline points="16 18 22 12 16 6"/><polyline points="8 6 2 12 8 18"/></svg>"#,
    r#"<svg width="48" height="48" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M9.09 9a3 3 0 0 1 5.83 1c0 2-3 3-3 3"/><circle cx="12" cy="12" r="10"/><path d="m12 17 .01 0"/></svg>"#,
];

fn services_markup(services: &[Service]) -> String {
    services
        .iter()
        .enumerate()
        .map(|(i, service)| {
            format!(
                "<div class=\"service-card\">\n  <div class=\"service-icon\">{}</div>\n  <h3>{}</h3>\n  <p>{}</p>\n</div>",
                SERVICE_ICONS[i % SERVICE_ICONS.len()],
                escape_html(&service.title),
                escape_html(&service.description)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn journey_markup(journey: &str) -> String {
    let mut out = String::from("<h2>My Journey</h2>");
    for paragraph in journey.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let _ = write!(out, "\n<p>{}</p>", escape_html(paragraph));
    }
    out
}

fn stats_markup(about: &AboutContent) -> String {
    about
        .stats
        .iter()
        .map(|stat| {
            format!(
                "<div class=\"stat-card\">\n  <h3>{}</h3>\n  <p>{}</p>\n</div>",
                escape_html(&stat.value),
                escape_html(&stat.label)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn education_markup(about: &AboutContent) -> String {
    about
        .education
        .iter()
        .map(|edu| {
            format!(
                "<div class=\"education-item\">\n  <div class=\"education-year\">{}</div>\n  <div class=\"education-content\">\n    <h3>{}</h3>\n    <p class=\"institution\">{}</p>\n    <p>{}</p>\n  </div>\n</div>",
                escape_html(&edu.year),
                escape_html(&edu.title),
                escape_html(&edu.institution),
                escape_html(&edu.description)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn skills_markup(about: &AboutContent) -> String {
    about
        .skills
        .iter()
        .map(|category| {
            let tags: String = category
                .skills
                .iter()
                .map(|skill| format!(r#"<span class="skill-tag">{}</span>"#, escape_html(skill)))
                .collect();
            format!(
                "<div class=\"skill-category\">\n  <h3>{}</h3>\n  <div class=\"skill-tags\">{}</div>\n</div>",
                escape_html(&category.name),
                tags
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
