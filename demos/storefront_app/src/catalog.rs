// demos/storefront_app/src/catalog.rs

use bookcart::{CatalogItem, ItemId};

/// The books the demo storefront sells.
pub fn seed_catalog() -> Vec<CatalogItem> {
  [
    ("978-0441013593", "Dune", 1899, 4),
    ("978-0141439587", "Emma", 999, 2),
    ("978-0199535675", "Ulysses", 1450, 1),
    ("978-0060850524", "Brave New World", 1599, 0),
  ]
  .into_iter()
  .map(|(isbn, title, price_cents, stock)| CatalogItem {
    id: ItemId::new(isbn),
    title: title.to_string(),
    price_cents,
    image_url: Some(format!("https://covers.example/{}.jpg", isbn)),
    stock,
  })
  .collect()
}

pub fn find<'a>(catalog: &'a [CatalogItem], title: &str) -> Option<&'a CatalogItem> {
  catalog.iter().find(|item| item.title == title)
}
