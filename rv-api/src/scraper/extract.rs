//! schema.org Recipe extraction from HTML
//!
//! Looks for a `Recipe` object in the page's JSON-LD blocks, descending
//! into arrays and `@graph` containers. Title, description and image fall
//! back to OpenGraph and plain meta tags when the JSON-LD leaves them out.

use rv_common::RecipeDraft;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Extract a recipe draft from a page, or `None` if it carries no recipe
pub fn extract_recipe(html: &str) -> Option<RecipeDraft> {
    let document = Html::parse_document(html);
    let recipe = find_json_ld_recipe(&document)?;

    let title = text_field(&recipe, "name")
        .or_else(|| meta_content(&document, "meta[property=\"og:title\"]"))
        .or_else(|| page_title(&document))?;

    Some(RecipeDraft {
        title,
        description: text_field(&recipe, "description")
            .or_else(|| meta_content(&document, "meta[property=\"og:description\"]"))
            .or_else(|| meta_content(&document, "meta[name=\"description\"]")),
        image_url: recipe
            .get("image")
            .and_then(image_url)
            .or_else(|| meta_content(&document, "meta[property=\"og:image\"]")),
        servings: recipe.get("recipeYield").and_then(recipe_yield),
        prep_time: duration_field(&recipe, "prepTime"),
        cook_time: duration_field(&recipe, "cookTime"),
        total_time: duration_field(&recipe, "totalTime"),
        ingredients: recipe
            .get("recipeIngredient")
            .map(string_list)
            .unwrap_or_default(),
        instructions: recipe
            .get("recipeInstructions")
            .map(|node| {
                let mut steps = Vec::new();
                collect_instructions(node, &mut steps);
                steps
            })
            .unwrap_or_default(),
    })
}

fn find_json_ld_recipe(document: &Html) -> Option<Value> {
    let selector = Selector::parse("script[type=\"application/ld+json\"]").ok()?;

    document.select(&selector).find_map(|script| {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => find_recipe_node(&value).cloned(),
            Err(e) => {
                debug!("Skipping unparseable JSON-LD block: {}", e);
                None
            }
        }
    })
}

fn find_recipe_node(node: &Value) -> Option<&Value> {
    match node {
        Value::Array(items) => items.iter().find_map(find_recipe_node),
        Value::Object(map) => {
            if map.get("@type").is_some_and(is_recipe_type) {
                return Some(node);
            }
            map.get("@graph").and_then(find_recipe_node)
        }
        _ => None,
    }
}

fn is_recipe_type(value: &Value) -> bool {
    match value {
        Value::String(s) => s == "Recipe",
        Value::Array(types) => types.iter().any(|t| t.as_str() == Some("Recipe")),
        _ => false,
    }
}

/// Decode entities, drop markup, collapse whitespace
pub fn clean_text(raw: &str) -> String {
    let decoded = if raw.contains('<') || raw.contains('&') {
        Html::parse_fragment(raw).root_element().text().collect::<String>()
    } else {
        raw.to_string()
    };
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(raw: &str) -> Option<String> {
    let text = clean_text(raw);
    (!text.is_empty()).then_some(text)
}

fn text_field(recipe: &Value, key: &str) -> Option<String> {
    recipe.get(key).and_then(Value::as_str).and_then(non_empty)
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .find_map(non_empty)
}

fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .find_map(|el| non_empty(&el.text().collect::<String>()))
}

fn image_url(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(map) => map.get("url").and_then(image_url),
        _ => None,
    }
}

fn recipe_yield(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(recipe_yield),
        _ => None,
    }
}

fn duration_field(recipe: &Value, key: &str) -> Option<String> {
    let raw = recipe.get(key)?.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    match parse_iso_duration(raw) {
        Some(rendered) if rendered.is_empty() => None,
        Some(rendered) => Some(rendered),
        None => non_empty(raw),
    }
}

/// Render an ISO-8601 duration (`PT1H30M`) as `1 h 30 min`.
///
/// Returns `None` if `raw` is not a duration and an empty string for a zero
/// duration. Years, months and weeks are not used by recipe sites and are
/// rejected.
pub fn parse_iso_duration(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix('P').or_else(|| raw.strip_prefix('p'))?;
    let (date_part, time_part) = match rest.find(['T', 't']) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };

    let mut days = 0u64;
    for (value, unit) in duration_components(date_part)? {
        match unit {
            'D' => days = days.checked_add(value)?,
            _ => return None,
        }
    }

    let (mut hours, mut minutes, mut seconds) = (0u64, 0u64, 0u64);
    if let Some(time_part) = time_part {
        let components = duration_components(time_part)?;
        if components.is_empty() {
            return None;
        }
        for (value, unit) in components {
            match unit {
                'H' => hours = hours.checked_add(value)?,
                'M' => minutes = minutes.checked_add(value)?,
                'S' => seconds = seconds.checked_add(value)?,
                _ => return None,
            }
        }
    }

    // Sites routinely write 90 minutes as PT90M
    minutes = minutes.checked_add(seconds / 60)?;
    seconds %= 60;
    hours = hours.checked_add(minutes / 60)?;
    minutes %= 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "min"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{} {}", value, unit))
        .collect();

    Some(parts.join(" "))
}

/// Split `1H30M` into `[(1, 'H'), (30, 'M')]`; fractions are truncated
fn duration_components(part: &str) -> Option<Vec<(u64, char)>> {
    let mut components = Vec::new();
    let mut number = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            number.push(c);
        } else {
            if number.is_empty() {
                return None;
            }
            let whole = number.split(['.', ',']).next().unwrap_or("0");
            components.push((whole.parse().ok()?, c.to_ascii_uppercase()));
            number.clear();
        }
    }

    number.is_empty().then_some(components)
}

fn string_list(node: &Value) -> Vec<String> {
    match node {
        Value::String(s) => non_empty(s).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(non_empty)
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_instructions(node: &Value, steps: &mut Vec<String>) {
    match node {
        Value::String(s) => {
            // A single block of text usually holds one step per line
            steps.extend(s.lines().filter_map(non_empty));
        }
        Value::Array(items) => {
            for item in items {
                collect_instructions(item, steps);
            }
        }
        Value::Object(map) => {
            if let Some(children) = map.get("itemListElement") {
                collect_instructions(children, steps);
            } else if let Some(text) = map
                .get("text")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .and_then(non_empty)
            {
                steps.push(text);
            }
        }
        _ => {}
    }
}
