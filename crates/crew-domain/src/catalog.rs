//! Catálogo de productos y categorías.
//!
//! Ambas entidades pueden llevar una imagen opcional: `image_url` es la URL
//! pública y `image_path` la ruta dentro del storage, necesaria para borrar el
//! blob cuando la imagen se reemplaza o la entidad se elimina.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::record::Record;
use crate::validate::{require_amount, require_text};

/// Par URL pública + ruta en storage de una imagen subida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub mc: Option<String>,
    pub cc: Option<String>,
    pub mp: f64,
    pub sp: f64,
    pub pt: f64,
    /// Etiqueta de la categoría a la que pertenece.
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub mc: Option<String>,
    pub cc: Option<String>,
    pub mp: f64,
    pub sp: f64,
    pub pt: f64,
    pub category: Option<String>,
    pub image: Option<StoredImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub mc: Option<String>,
    pub cc: Option<String>,
    pub mp: Option<f64>,
    pub sp: Option<f64>,
    pub pt: Option<f64>,
    pub category: Option<String>,
    pub image: Option<StoredImage>,
}

impl Record for Product {
    type Draft = ProductDraft;
    type Patch = ProductPatch;

    const COLLECTION: &'static str = "products";
    const LABEL: &'static str = "product";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate_draft(draft: &ProductDraft) -> Result<(), DomainError> {
        require_text("name", &draft.name)?;
        require_amount("mp", draft.mp)?;
        require_amount("sp", draft.sp)?;
        require_amount("pt", draft.pt)
    }

    fn validate_patch(patch: &ProductPatch) -> Result<(), DomainError> {
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        for (field, value) in [("mp", patch.mp), ("sp", patch.sp), ("pt", patch.pt)] {
            if let Some(v) = value {
                require_amount(field, v)?;
            }
        }
        Ok(())
    }

    fn from_draft(id: Uuid, draft: ProductDraft, now: DateTime<Utc>) -> Self {
        let (image_url, image_path) = split_image(draft.image);
        Product { id,
                  name: draft.name.trim().to_string(),
                  image_url,
                  image_path,
                  mc: draft.mc,
                  cc: draft.cc,
                  mp: draft.mp,
                  sp: draft.sp,
                  pt: draft.pt,
                  category: draft.category,
                  created_at: now,
                  updated_at: now }
    }

    fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if patch.mc.is_some() {
            self.mc = patch.mc;
        }
        if patch.cc.is_some() {
            self.cc = patch.cc;
        }
        if let Some(v) = patch.mp {
            self.mp = v;
        }
        if let Some(v) = patch.sp {
            self.sp = v;
        }
        if let Some(v) = patch.pt {
            self.pt = v;
        }
        if patch.category.is_some() {
            self.category = patch.category;
        }
        if let Some(image) = patch.image {
            self.image_url = Some(image.url);
            self.image_path = Some(image.path);
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: Uuid,
    pub label: String,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub label: String,
    pub image: Option<StoredImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub label: Option<String>,
    pub image: Option<StoredImage>,
}

impl Record for ProductCategory {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;

    const COLLECTION: &'static str = "product_categories";
    const LABEL: &'static str = "category";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate_draft(draft: &CategoryDraft) -> Result<(), DomainError> {
        require_text("label", &draft.label)
    }

    fn validate_patch(patch: &CategoryPatch) -> Result<(), DomainError> {
        match &patch.label {
            Some(label) => require_text("label", label),
            None => Ok(()),
        }
    }

    fn from_draft(id: Uuid, draft: CategoryDraft, now: DateTime<Utc>) -> Self {
        let (image_url, image_path) = split_image(draft.image);
        ProductCategory { id,
                          label: draft.label.trim().to_string(),
                          image_url,
                          image_path,
                          created_at: now,
                          updated_at: now }
    }

    fn apply_patch(&mut self, patch: CategoryPatch, now: DateTime<Utc>) {
        if let Some(label) = patch.label {
            self.label = label.trim().to_string();
        }
        if let Some(image) = patch.image {
            self.image_url = Some(image.url);
            self.image_path = Some(image.path);
        }
        self.updated_at = now;
    }
}

fn split_image(image: Option<StoredImage>) -> (Option<String>, Option<String>) {
    match image {
        Some(StoredImage { url, path }) => (Some(url), Some(path)),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_draft_rejects_negative_prices() {
        let draft = ProductDraft { name: "Burger".into(),
                                   sp: -3.0,
                                   ..Default::default() };
        let err = Product::validate_draft(&draft).unwrap_err();
        assert_eq!(err, DomainError::invalid("sp", "must be a non-negative number"));
    }

    #[test]
    fn image_patch_sets_url_and_path_together() {
        let draft = CategoryDraft { label: "Burgers".into(), image: None };
        let mut cat = ProductCategory::from_draft(Uuid::new_v4(), draft, Utc::now());
        assert!(cat.image_path.is_none());
        let img = StoredImage { url: "https://cdn/categories/1.png".into(),
                                path: "categories/1.png".into() };
        cat.apply_patch(CategoryPatch { image: Some(img), ..Default::default() }, Utc::now());
        assert_eq!(cat.image_path.as_deref(), Some("categories/1.png"));
        assert_eq!(cat.image_url.as_deref(), Some("https://cdn/categories/1.png"));
    }
}
