//! Store del catálogo: registros con imagen opcional.
//!
//! Orden de operaciones con imágenes:
//! - crear: subir, insertar; si la inserción falla se libera el blob nuevo.
//! - editar: subir el reemplazo, actualizar la fila, y sólo entonces liberar
//!   el blob anterior; si la fila falla se libera el nuevo.
//! - borrar: borrar la fila y después su blob.
use crew_domain::{CategoryDraft, CategoryPatch, Product, ProductCategory, ProductDraft, ProductPatch, Record,
                  StoredImage};
use uuid::Uuid;

use crate::boundary::BlobFile;
use crate::errors::CoreError;
use crate::images::{ImageAttachments, ImageFolder};
use crate::notify::Operation;
use crate::store::RecordStore;

/// Registro que puede llevar una imagen en el storage.
pub trait Illustrated: Record {
    const FOLDER: ImageFolder;

    fn image_path(&self) -> Option<&str>;
    fn attach_to_draft(draft: &mut Self::Draft, image: StoredImage);
    fn attach_to_patch(patch: &mut Self::Patch, image: StoredImage);
}

impl Illustrated for Product {
    const FOLDER: ImageFolder = ImageFolder::Products;

    fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    fn attach_to_draft(draft: &mut ProductDraft, image: StoredImage) {
        draft.image = Some(image);
    }

    fn attach_to_patch(patch: &mut ProductPatch, image: StoredImage) {
        patch.image = Some(image);
    }
}

impl Illustrated for ProductCategory {
    const FOLDER: ImageFolder = ImageFolder::Categories;

    fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    fn attach_to_draft(draft: &mut CategoryDraft, image: StoredImage) {
        draft.image = Some(image);
    }

    fn attach_to_patch(patch: &mut CategoryPatch, image: StoredImage) {
        patch.image = Some(image);
    }
}

pub struct CatalogStore<R: Illustrated> {
    records: RecordStore<R>,
    images: ImageAttachments,
}

impl<R: Illustrated> CatalogStore<R> {
    pub fn new(records: RecordStore<R>, images: ImageAttachments) -> Self {
        Self { records, images }
    }

    /// Store subyacente (listados, suscripciones).
    pub fn records(&self) -> &RecordStore<R> {
        &self.records
    }

    pub async fn create(&self, mut draft: R::Draft, file: Option<&BlobFile>) -> Result<R, CoreError> {
        if let Err(err) = R::validate_draft(&draft) {
            return Err(self.records.fail(Operation::Add, err.into()).await);
        }
        let uploaded = match file {
            Some(file) => match self.images.attach_image(R::FOLDER, file).await {
                Ok(image) => Some(image),
                Err(err) => return Err(self.records.fail(Operation::Add, err).await),
            },
            None => None,
        };
        if let Some(image) = &uploaded {
            R::attach_to_draft(&mut draft, image.clone());
        }
        match self.records.create(draft).await {
            Ok(row) => Ok(row),
            Err(err) => {
                if let Some(image) = uploaded {
                    self.images.release_image(R::FOLDER, &image.path).await;
                }
                Err(err)
            }
        }
    }

    pub async fn update(&self, id: Uuid, mut patch: R::Patch, file: Option<&BlobFile>) -> Result<R, CoreError> {
        if let Err(err) = R::validate_patch(&patch) {
            return Err(self.records.fail(Operation::Update, err.into()).await);
        }
        let Some(file) = file else {
            return self.records.update(id, patch).await;
        };
        let old_path = self.current_image_path(id, Operation::Update).await?;
        let image = match self.images.attach_image(R::FOLDER, file).await {
            Ok(image) => image,
            Err(err) => return Err(self.records.fail(Operation::Update, err).await),
        };
        R::attach_to_patch(&mut patch, image.clone());
        match self.records.update(id, patch).await {
            Ok(row) => {
                if let Some(old) = old_path.filter(|old| *old != image.path) {
                    self.images.release_image(R::FOLDER, &old).await;
                }
                Ok(row)
            }
            Err(err) => {
                self.images.release_image(R::FOLDER, &image.path).await;
                Err(err)
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let old_path = self.current_image_path(id, Operation::Delete).await?;
        self.records.delete(id).await?;
        if let Some(old) = old_path {
            self.images.release_image(R::FOLDER, &old).await;
        }
        Ok(())
    }

    async fn current_image_path(&self, id: Uuid, op: Operation) -> Result<Option<String>, CoreError> {
        if let Some(row) = self.records.find(id).await {
            return Ok(row.image_path().map(str::to_string));
        }
        match self.records.get_by_id(id).await {
            Ok(row) => Ok(row.and_then(|r| r.image_path().map(str::to_string))),
            Err(err) => Err(self.records.fail(op, err).await),
        }
    }
}
