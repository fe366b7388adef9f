use scraper::Html;

use crate::config::{Building, Config};
use crate::parse::cleanup::CleanupOptions;
use crate::parse::counters::{counter_blocks, render_blocks, special_block};
use crate::parse::dietary::{annotate, ICON_CONTAINER, MENSARIA_ICON_CONTAINER};
use crate::parse::tree::{DocumentTree, Query};
use crate::parse::week::{is_week_plan, split_days};
use crate::parse::HtmlTree;
use crate::trigger::MenuRequest;

pub const FAILURE_MESSAGE: &str = "Konnte Mensa-Infos nicht abrufen :-(";

pub fn header(building: Building) -> String {
    format!("# Die {building} empfiehlt:\n")
}

const fn icon_containers(building: Building) -> &'static [Query] {
    match building {
        Building::Mensa => &[ICON_CONTAINER],
        Building::Mensaria => &[ICON_CONTAINER, MENSARIA_ICON_CONTAINER],
    }
}

/// Parses a fetched page and renders the chat message for it.
pub fn render_page(page: &str, request: &MenuRequest, config: &Config) -> String {
    let document = Html::parse_document(page);
    render(&HtmlTree::new(&document), request, config)
}

pub fn render<T: DocumentTree>(tree: &T, request: &MenuRequest, config: &Config) -> String {
    let options = CleanupOptions {
        icon_base_url: &config.icon_base_url,
        markdown_images: config.markdown_images,
    };
    let annotations = annotate(tree, icon_containers(request.building));
    if annotations.is_empty() {
        log::debug!("no dietary icons on the page");
    }

    if request.display_type.is_week() && is_week_plan(tree) {
        let mut menu = format!(
            "# Wochenplan {} ({}):\n",
            request.building,
            request.display_type.label()
        );
        for day in split_days(tree) {
            menu.push_str(&format!("\n# {}\n", day.label));
            menu.push_str(&render_blocks(
                &counter_blocks(tree, &day.sections, &annotations),
                &options,
            ));
        }
        return menu;
    }

    let blocks = counter_blocks(tree, &[tree.root()], &annotations);
    log::debug!("rendering {} counters", blocks.len());
    let mut menu = header(request.building) + &render_blocks(&blocks, &options);
    if request.building == Building::Mensaria {
        if let Some(special) = special_block(tree, &annotations) {
            menu.push('\n');
            menu.push_str(&render_blocks(&[special], &options));
        }
    }
    menu
}
