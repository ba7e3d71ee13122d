use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{category, product};

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Lowercases, drops punctuation and joins words with `-`.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lowered, "");
    SLUG_SEPARATORS
        .replace_all(cleaned.trim(), "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

pub async fn unique_product_slug<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude_id: Option<i32>,
) -> Result<String, DbErr> {
    let base = slugify(name);
    let mut slug = base.clone();
    let mut counter = 1;
    loop {
        let mut finder = product::Entity::find().filter(product::Column::Slug.eq(slug.as_str()));
        if let Some(id) = exclude_id {
            finder = finder.filter(product::Column::Id.ne(id));
        }
        if finder.count(db).await? == 0 {
            return Ok(slug);
        }
        slug = format!("{base}-{counter}");
        counter += 1;
    }
}

pub async fn unique_category_slug<C: ConnectionTrait>(db: &C, name: &str) -> Result<String, DbErr> {
    let base = slugify(name);
    let mut slug = base.clone();
    let mut counter = 1;
    while category::Entity::find()
        .filter(category::Column::Slug.eq(slug.as_str()))
        .count(db)
        .await?
        > 0
    {
        slug = format!("{base}-{counter}");
        counter += 1;
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_joins_words_with_dashes() {
        assert_eq!(slugify("Hand Woven  Basket"), "hand-woven-basket");
        assert_eq!(slugify("Clay Pot (Large)!"), "clay-pot-large");
        assert_eq!(slugify("  -nakshi kantha- "), "nakshi-kantha");
    }
}
