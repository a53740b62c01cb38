/// The two request/response cycles the presentation layer drives.
///
/// Capture: geolocation fix → draft validation → image write → insert.
/// View: full load → map assembly.

use tracing::{info, warn};

use crate::assets::ImageAssetStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geo::GeolocationProvider;
use crate::map::{MapAssembler, MapView, PopupRenderer};
use crate::state::{CustomerType, DraftRecord, LocationRepository, RecordId};

/// A photo attached to a capture
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// Extension of the original file, e.g. `jpg`
    pub extension: String,
}

/// Fields entered on the capture form
#[derive(Debug, Clone, Default)]
pub struct CaptureForm {
    pub name: String,
    pub phone: String,
    pub customer_type: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Store one customer visit.
///
/// Nothing is written unless the provider has a fix and the form is valid.
/// If the image is written but the insert then fails, the image stays behind
/// as an orphan (see [`ImageAssetStore::orphans`]).
pub fn capture(
    provider: &dyn GeolocationProvider,
    assets: &ImageAssetStore,
    repository: &LocationRepository,
    form: CaptureForm,
) -> Result<RecordId> {
    let Some(coordinate) = provider.attempt_capture().coordinate() else {
        return Err(Error::GeolocationUnavailable);
    };

    let customer_type: CustomerType = form.customer_type.parse()?;
    let mut draft = DraftRecord {
        name: form.name,
        phone: form.phone,
        customer_type,
        address: non_blank(form.address),
        notes: non_blank(form.notes),
        coordinate,
        image_path: None,
    };
    draft.validate()?;

    if let Some(image) = form.image {
        draft.image_path = Some(assets.store(&image.bytes, &image.extension)?);
    }

    match repository.insert(&draft) {
        Ok(id) => {
            info!("Captured customer {} at {}", id, coordinate);
            Ok(id)
        }
        Err(err) => {
            if let Some(asset) = &draft.image_path {
                warn!("Insert failed, asset {} is now unreferenced", asset);
            }
            Err(err)
        }
    }
}

/// Build the map for the current record set, always from a fresh load.
pub fn view(
    repository: &LocationRepository,
    assets: &ImageAssetStore,
    config: &Config,
) -> Result<MapView> {
    let records = repository.load_all()?;

    let popups = PopupRenderer::new(assets, config.thumbnail_max_dim);
    let assembler = MapAssembler::new(popups)
        .with_zoom(config.map.zoom)
        .with_heat_radius(config.map.heat_radius);

    Ok(assembler.assemble(&records))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
