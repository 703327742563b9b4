//! Static HTML generation: share pages carrying per-location preview
//! metadata, and long-form narrative pages for regions.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use minijinja::{context, Environment, Value};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{NarrativeConfig, SiteConfig};
use crate::data::{Dataset, Level, Unit};
use crate::normalize::{dir_slug, filename_slug};
use crate::route::{static_filename, PageMeta, Selection};

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// What a generation run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub dir: PathBuf,
    pub pages: usize,
}

/// A share page: preview metadata plus a redirect into the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePage {
    pub filename: String,
    pub meta: PageMeta,
    /// `#/{country}[/{region}[/{city}]]`
    pub hash: String,
}

/// Hash segment used by share pages: the filename slug without hyphens
fn hash_segment(s: &str) -> String {
    filename_slug(s).replace('-', "")
}

fn share_page(site: &SiteConfig, selection: Selection<'_>, segments: &[&str]) -> SharePage {
    let hash = format!(
        "#/{}",
        segments
            .iter()
            .map(|s| hash_segment(s))
            .collect::<Vec<_>>()
            .join("/")
    );
    SharePage {
        filename: static_filename(selection.country, selection.level, selection.unit),
        meta: PageMeta::for_selection(Some(&selection), site),
        hash,
    }
}

/// Every share page of the dataset: one per country, one per region and
/// one per city whose parent slug matches its region
pub fn share_pages(dataset: &Dataset, site: &SiteConfig) -> Vec<SharePage> {
    let mut pages = Vec::new();

    for (country, record) in dataset.countries() {
        let select = |level, unit| Selection {
            country,
            record,
            level,
            unit,
        };

        pages.push(share_page(site, select(Level::Country, record.country.first()), &[country]));

        for region in &record.large_units {
            pages.push(share_page(
                site,
                select(Level::LargeUnits, Some(region)),
                &[country, region.name()],
            ));

            let region_slug = filename_slug(region.name());
            let cities = record
                .small_units
                .iter()
                .filter(|city| filename_slug(city.parent().unwrap_or_default()) == region_slug);
            for city in cities {
                pages.push(share_page(
                    site,
                    select(Level::SmallUnits, Some(city)),
                    &[country, region.name(), city.name()],
                ));
            }
        }
    }

    // Names that slug alike share a file; the first one wins
    let mut seen = HashSet::new();
    pages.retain(|page| {
        let fresh = seen.insert(page.filename.clone());
        if !fresh {
            warn!(file = %page.filename, title = %page.meta.title, "duplicate share page skipped");
        }
        fresh
    });
    pages
}

pub fn render_share_page(page: &SharePage, site: &SiteConfig) -> String {
    let title = escape_html(&page.meta.title);
    let description = escape_html(&page.meta.description);
    let og_url = escape_html(&format!("{}/{}", site.base_url(), page.hash));
    let redirect = escape_html(&format!(
        "{}/{}",
        site.base_path.trim_end_matches('/'),
        page.hash
    ));

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>

    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:type" content="website">
    <meta property="og:url" content="{og_url}">

    <meta name="twitter:card" content="summary">
    <meta name="twitter:title" content="{title}">
    <meta name="twitter:description" content="{description}">

    <meta http-equiv="refresh" content="0; url={redirect}">
    <script>
        window.location.replace('{redirect}');
    </script>

    <style>
        body {{
            font-family: Arial, sans-serif;
            text-align: center;
            padding: 50px;
            background: #f9f1e3;
            color: #333;
        }}
        .loading {{
            font-size: 18px;
            margin: 20px 0;
        }}
        .redirecting {{
            font-size: 14px;
            color: #666;
        }}
    </style>
</head>
<body>
    <div class="loading">Cargando visualización...</div>
    <div class="redirecting">Redirigiendo a la aplicación interactiva...</div>
    <p>Si no eres redirigido automáticamente, <a href="{redirect}">haz clic aquí</a>.</p>
</body>
</html>
"#
    )
}

/// Write every share page under `out`, in parallel
pub fn write_share_pages(dataset: &Dataset, site: &SiteConfig, out: &Path) -> Result<SiteReport> {
    fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;
    let pages = share_pages(dataset, site);

    pages.par_iter().try_for_each(|page| {
        let path = out.join(&page.filename);
        fs::write(&path, render_share_page(page, site))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(file = %page.filename, hash = %page.hash, "share page written");
        Ok::<_, anyhow::Error>(())
    })?;

    info!(dir = %out.display(), pages = pages.len(), "share pages generated");
    Ok(SiteReport {
        dir: out.to_path_buf(),
        pages: pages.len(),
    })
}

/// A region's narrative page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativePage {
    pub country: String,
    /// Directory under the country, `dir_slug(name)`
    pub dir: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub url: String,
    /// Narrative fields in document order
    pub fields: Vec<(String, String)>,
}

impl NarrativePage {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `{country}/{dir}/index.html` relative to the output root
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.country).join(&self.dir).join("index.html")
    }
}

fn narrative_page(
    country: &str,
    unit: &Unit,
    site: &SiteConfig,
    narrative: &NarrativeConfig,
) -> Option<NarrativePage> {
    let block = unit.narrative.as_ref()?;
    let name = unit.name().to_string();
    let dir = dir_slug(&name);
    let headline = unit.narrative_field("TITLE").unwrap_or_default();

    Some(NarrativePage {
        country: country.to_string(),
        title: format!("{} — {}", narrative.title_prefix, name),
        description: format!("{} ({}): {}", name, site.country_name(country), headline),
        url: format!("{}{}/{}", narrative.base_url, country, dir),
        fields: block
            .keys()
            .filter_map(|k| unit.narrative_field(k).map(|v| (k.clone(), v)))
            .collect(),
        dir,
        name,
    })
}

/// Narrative pages for every region that carries a NARRATIVE block
pub fn narrative_pages(
    dataset: &Dataset,
    site: &SiteConfig,
    narrative: &NarrativeConfig,
) -> Vec<NarrativePage> {
    dataset
        .countries()
        .flat_map(|(country, record)| {
            record
                .large_units
                .iter()
                .filter_map(move |unit| narrative_page(country, unit, site, narrative))
        })
        .collect()
}

/// Name the custom narrative template is registered under
const NARRATIVE_TEMPLATE: &str = "narrative";

/// Compile a custom narrative template. Placeholders use minijinja syntax:
/// `{{ NAME }}`, `{{ PAGE_TITLE }}`, `{{ DESCRIPTION }}`, `{{ URL }}` and
/// `{{ FIELD.<name> }}`.
pub fn narrative_environment(source: &str) -> Result<Environment<'_>> {
    let mut env = Environment::new();
    env.add_template(NARRATIVE_TEMPLATE, source)
        .context("Invalid narrative template")?;
    Ok(env)
}

/// Fill the compiled template. Narrative fields are inserted as authored,
/// everything else is escaped. Unknown fields render empty. Inserted values
/// are never scanned for placeholders.
pub fn fill_template(env: &Environment<'_>, page: &NarrativePage) -> Result<String> {
    let fields: BTreeMap<String, Value> = page
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_safe_string(v.clone())))
        .collect();
    let escaped = |s: &str| Value::from_safe_string(escape_html(s));

    env.get_template(NARRATIVE_TEMPLATE)?
        .render(context! {
            NAME => escaped(&page.name),
            PAGE_TITLE => escaped(&page.title),
            DESCRIPTION => escaped(&page.description),
            URL => escaped(&page.url),
            FIELD => fields,
        })
        .with_context(|| format!("Failed to render narrative page for {}", page.name))
}

/// Built-in narrative page
pub fn render_narrative_page(page: &NarrativePage) -> String {
    let title = escape_html(&page.title);
    let description = escape_html(&page.description);
    let url = escape_html(&page.url);

    let body: String = page
        .fields
        .iter()
        .map(|(k, v)| {
            format!(
                "    <section data-relato-campo=\"{}\">{}</section>\n",
                escape_html(k),
                escape_html(v)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:type" content="article">
    <meta property="og:url" content="{url}">
</head>
<body>
    <h1 class="static-page-place-name">{name}</h1>
{body}</body>
</html>
"#,
        name = escape_html(&page.name)
    )
}

/// Write narrative pages under `out/{country}/{dir}/index.html`
pub fn write_narrative_pages(
    dataset: &Dataset,
    site: &SiteConfig,
    narrative: &NarrativeConfig,
    out: &Path,
) -> Result<SiteReport> {
    let template = narrative
        .template
        .as_deref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display()))
        })
        .transpose()?;
    let env = template.as_deref().map(narrative_environment).transpose()?;

    let pages = narrative_pages(dataset, site, narrative);

    pages.par_iter().try_for_each(|page| {
        let path = out.join(page.relative_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let html = match &env {
            Some(env) => fill_template(env, page)?,
            None => render_narrative_page(page),
        };
        fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "narrative page written");
        Ok::<_, anyhow::Error>(())
    })?;

    info!(dir = %out.display(), pages = pages.len(), "narrative pages generated");
    Ok(SiteReport {
        dir: out.to_path_buf(),
        pages: pages.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_dataset;
    use crate::route::{Resolution, Resolver};
    use crate::testdata::sample_dataset;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_share_page_inventory() {
        let ds = sample_dataset();
        let pages = share_pages(&ds, &SiteConfig::default());
        let names: Vec<&str> = pages.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "argentina.html",
                "argentina-cordoba.html",
                "argentina-cordoba-rio-cuarto.html",
                "argentina-cordoba-villa-maria.html",
                "argentina-cordoba-san-francisco.html",
                "argentina-buenos-aires.html",
                "argentina-buenos-aires-la-plata.html",
                "argentina-misiones.html",
                "argentina-tierra-del-fuego.html",
                "mexico.html",
                "mexico-ciudad-de-mexico.html",
                "mexico-ciudad-de-mexico-alvaro-obregon.html",
            ]
        );
    }

    #[test]
    fn test_share_page_hash_resolves_back() {
        let ds = sample_dataset();
        let resolver = Resolver::new(&ds);
        for page in share_pages(&ds, &SiteConfig::default()) {
            let Resolution::Resolved(sel) = resolver.resolve(&page.hash) else {
                panic!("{} did not resolve", page.hash);
            };
            assert_eq!(static_filename(sel.country, sel.level, sel.unit), page.filename);
        }
    }

    #[test]
    fn test_share_page_html() {
        let ds = sample_dataset();
        let site = SiteConfig::default();
        let pages = share_pages(&ds, &site);
        let page = pages
            .iter()
            .find(|p| p.filename == "argentina-cordoba-rio-cuarto.html")
            .unwrap();
        assert_eq!(page.hash, "#/argentina/cordoba/riocuarto");

        let html = render_share_page(page, &site);
        assert!(html.contains("<title>Desiertos: Río Cuarto, Córdoba, Argentina</title>"));
        assert!(html.contains(
            r#"<meta property="og:url" content="https://coldfoot.studio/desiertos-latinoamerica/experiments/d3-viz/#/argentina/cordoba/riocuarto">"#
        ));
        assert!(html.contains(
            "window.location.replace('/desiertos-latinoamerica/experiments/d3-viz/#/argentina/cordoba/riocuarto');"
        ));
        assert!(html.contains("haz clic aquí"));
    }

    #[test]
    fn test_write_share_pages() {
        let dir = tempfile::tempdir().unwrap();
        let ds = sample_dataset();
        let report = write_share_pages(&ds, &SiteConfig::default(), dir.path()).unwrap();
        assert_eq!(report.pages, 12);
        assert!(dir.path().join("mexico.html").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 12);
    }

    #[test]
    fn test_colliding_filenames_keep_first_page() {
        let mut json = r#"{
          "argentina": {
            "large_units": [
              {"BASIC_INFO": {"KEY": "AR-D", "NAME": "San Luis", "PARENT": "argentina"}},
              {"BASIC_INFO": {"KEY": "AR-X", "NAME": "San-Luis", "PARENT": "argentina"}}
            ]
          }
        }"#
        .as_bytes()
        .to_vec();
        let ds = parse_dataset(&mut json).unwrap();
        let site = SiteConfig::default();

        let pages = share_pages(&ds, &site);
        let files: Vec<&str> = pages.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(files, ["argentina.html", "argentina-san-luis.html"]);
        assert_eq!(pages[1].meta.title, "Desiertos: San Luis, Argentina");

        let dir = tempfile::tempdir().unwrap();
        let report = write_share_pages(&ds, &site, dir.path()).unwrap();
        assert_eq!(report.pages, 2);
        let html = fs::read_to_string(dir.path().join("argentina-san-luis.html")).unwrap();
        assert!(html.contains("<title>Desiertos: San Luis, Argentina</title>"));
    }

    #[test]
    fn test_narrative_pages() {
        let ds = sample_dataset();
        let pages = narrative_pages(&ds, &SiteConfig::default(), &NarrativeConfig::default());
        assert_eq!(pages.len(), 1);

        let page = &pages[0];
        assert_eq!(page.dir, "cordoba");
        assert_eq!(page.title, "Desiertos de Noticias Locales — Córdoba");
        assert_eq!(page.description, "Córdoba (Argentina): Un desierto que avanza");
        assert_eq!(
            page.url,
            "https://desiertosinformativos.fundaciongabo.org/static/argentina/cordoba"
        );
        assert_eq!(page.field("RESUMEN"), Some("Córdoba tiene <100> medios."));
        assert_eq!(page.relative_path(), Path::new("argentina/cordoba/index.html"));

        let html = render_narrative_page(page);
        assert!(html.contains("Córdoba tiene &lt;100&gt; medios."));
    }

    #[test]
    fn test_fill_template() {
        let ds = sample_dataset();
        let pages = narrative_pages(&ds, &SiteConfig::default(), &NarrativeConfig::default());
        let env = narrative_environment(
            "<h1>{{ NAME }}</h1><p>{{ FIELD.RESUMEN }}</p><p>{{ FIELD.MISSING }}</p><a href=\"{{ URL }}\">",
        )
        .unwrap();
        let html = fill_template(&env, &pages[0]).unwrap();
        assert_eq!(
            html,
            "<h1>Córdoba</h1><p>Córdoba tiene <100> medios.</p><p></p><a href=\"https://desiertosinformativos.fundaciongabo.org/static/argentina/cordoba\">"
        );
    }

    #[test]
    fn test_field_values_are_not_expanded() {
        let ds = sample_dataset();
        let mut page = narrative_pages(&ds, &SiteConfig::default(), &NarrativeConfig::default())
            .remove(0);
        page.fields = vec![
            ("RESUMEN".to_string(), "Ver {{FIELD: nota".to_string()),
            ("NOTA".to_string(), "{{ FIELD.RESUMEN }} y {{ NAME }}".to_string()),
        ];
        let env = narrative_environment(
            "<p>{{ FIELD.RESUMEN }}</p><h2>{{ NAME }}</h2><p>{{ FIELD.NOTA }}</p><p>{{ FIELD.MISSING }}</p>",
        )
        .unwrap();
        let html = fill_template(&env, &page).unwrap();
        assert_eq!(
            html,
            "<p>Ver {{FIELD: nota</p><h2>Córdoba</h2><p>{{ FIELD.RESUMEN }} y {{ NAME }}</p><p></p>"
        );
    }

    #[test]
    fn test_invalid_template_is_an_error() {
        let err = narrative_environment("<p>{{ FIELD. }}</p>").unwrap_err();
        assert!(err.to_string().contains("Invalid narrative template"));
    }

    #[test]
    fn test_write_narrative_pages_with_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.html");
        fs::write(&template, "<title>{{ PAGE_TITLE }}</title>").unwrap();
        let narrative = NarrativeConfig {
            template: Some(template),
            ..NarrativeConfig::default()
        };

        let out = dir.path().join("static");
        let ds = sample_dataset();
        let report = write_narrative_pages(&ds, &SiteConfig::default(), &narrative, &out).unwrap();
        assert_eq!(report.pages, 1);
        let html = fs::read_to_string(out.join("argentina/cordoba/index.html")).unwrap();
        assert_eq!(html, "<title>Desiertos de Noticias Locales — Córdoba</title>");
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let narrative = NarrativeConfig {
            template: Some(dir.path().join("nope.html")),
            ..NarrativeConfig::default()
        };
        let err = write_narrative_pages(&sample_dataset(), &SiteConfig::default(), &narrative, dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read template"));
    }
}
