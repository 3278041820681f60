use tracing::{debug, info};

use citysecrets_shared::validation::{validate_form, SpotForm};
use citysecrets_shared::{SpotDocument, SpotId, SpotView};

use crate::client::SpotsClient;
use crate::error::Result;
use crate::events::{ClientEvent, SpotCollection};
use crate::state::SpotDetail;

impl SpotsClient {
    /// Reload every spot.
    pub async fn fetch_spots(&self) -> Result<Vec<SpotView>> {
        let _loading = self.begin();
        let result = self.load_spots(None).await;
        self.report("fetch_spots", result, None, "Failed to fetch spots")
    }

    /// Spots in one city.  A blank city lists every spot.
    pub async fn fetch_spots_by_city(&self, city: &str) -> Result<Vec<SpotView>> {
        let city = city.trim();
        let _loading = self.begin();
        let result = self
            .load_spots((!city.is_empty()).then_some(city))
            .await;
        self.report("fetch_spots_by_city", result, None, "Failed to fetch spots")
    }

    /// Spots created by the connected account.
    pub async fn fetch_user_spots(&self) -> Result<Vec<SpotView>> {
        let _loading = self.begin();
        let result = self.load_user_spots().await;
        self.report("fetch_user_spots", result, None, "Failed to fetch user spots")
    }

    /// Open one spot with its comments.
    pub async fn load_spot(&self, id: SpotId) -> Result<SpotDetail> {
        let _loading = self.begin();
        let result = self.reload_detail(id).await;
        self.report("load_spot", result, None, "Failed to load spot")
    }

    /// Publish a new spot: photos first, then the on-chain record, then
    /// the backend document keyed by the id the contract assigned.
    pub async fn create_spot(&self, form: &SpotForm) -> Result<SpotDocument> {
        let _loading = self.begin();
        let result = self.try_create_spot(form).await;
        self.report(
            "create_spot",
            result,
            Some("Spot created successfully"),
            "Failed to create spot",
        )
    }

    /// Delete one of the connected account's spots.
    pub async fn delete_spot(&self, id: SpotId) -> Result<()> {
        let _loading = self.begin();
        let result = self.try_delete_spot(id).await;
        self.report(
            "delete_spot",
            result,
            Some("Spot deleted successfully"),
            "Failed to delete spot",
        )
    }

    async fn load_spots(&self, city: Option<&str>) -> Result<Vec<SpotView>> {
        if self.address().is_none() {
            debug!("Wallet not connected, skipping spot refresh");
            return Ok(Vec::new());
        }
        let (_, contract) = self.connected().await?;

        let documents = match city {
            Some(city) => self.backend.list_spots_by_city(city).await?,
            None => self.backend.list_spots().await?,
        };
        let views = self.reconciler.merge_all(contract.as_ref(), documents).await?;

        {
            let mut state = self.lock_state();
            state.spots = views.clone();
            state.search_city = city.map(str::to_string);
        }
        self.events.emit(ClientEvent::SpotsUpdated {
            collection: SpotCollection::Spots,
            count: views.len(),
        });
        Ok(views)
    }

    pub(crate) async fn load_user_spots(&self) -> Result<Vec<SpotView>> {
        let Some(address) = self.address() else {
            self.lock_state().user_spots.clear();
            return Ok(Vec::new());
        };
        let (_, contract) = self.connected().await?;

        let documents = self.backend.list_spots_by_user(address).await?;
        let views = self.reconciler.merge_all(contract.as_ref(), documents).await?;

        self.lock_state().user_spots = views.clone();
        self.events.emit(ClientEvent::SpotsUpdated {
            collection: SpotCollection::UserSpots,
            count: views.len(),
        });
        Ok(views)
    }

    pub(crate) async fn reload_detail(&self, id: SpotId) -> Result<SpotDetail> {
        let (_, contract) = self.connected().await?;

        let document = self.backend.get_spot(id).await?;
        let spot = self.reconciler.merge_one(contract.as_ref(), document).await?;
        let comments = self.backend.list_comments(id).await?;

        let detail = SpotDetail { spot, comments };
        self.lock_state().spot_detail = Some(detail.clone());
        self.events.emit(ClientEvent::SpotsUpdated {
            collection: SpotCollection::Detail,
            count: 1,
        });
        Ok(detail)
    }

    async fn try_create_spot(&self, form: &SpotForm) -> Result<SpotDocument> {
        let draft = validate_form(form)?;
        let (address, contract) = self.connected().await?;
        self.require_registered(contract.as_ref(), address, "creating a spot")
            .await?;

        let photos = self.backend.upload_photos(&draft.photos).await?;
        debug!(count = photos.len(), "Photos uploaded");

        let pending = contract.create_spot(draft.category).await?;
        info!(tx = %pending.hash(), category = %draft.category, "Spot creation submitted");
        let created = pending.confirm().await?;

        let document = SpotDocument {
            document_id: None,
            spot_id: created.spot_id,
            creator: address,
            name: draft.name,
            username: created.username,
            description: draft.description,
            category: draft.category,
            location: draft.location,
            photos,
            created_at: None,
        };
        let saved = self.backend.create_spot(&document).await?;
        info!(spot_id = %created.spot_id, "Spot created");

        self.refresh_after_change().await;
        Ok(saved)
    }

    async fn try_delete_spot(&self, id: SpotId) -> Result<()> {
        let (_, contract) = self.connected().await?;

        let pending = contract.delete_spot(id).await?;
        info!(spot_id = %id, tx = %pending.hash(), "Spot deletion submitted");
        pending.confirm().await?;

        self.backend.delete_spot(id).await?;

        {
            let mut state = self.lock_state();
            if state.spot_detail.as_ref().is_some_and(|d| d.spot.spot_id() == id) {
                state.spot_detail = None;
            }
        }
        self.refresh_after_change().await;
        Ok(())
    }

    /// Reload the detail view if it shows `id`.  A failure is reported
    /// like any other refresh failure.
    pub(crate) async fn refresh_detail_if_open(&self, id: SpotId) {
        let open = self
            .lock_state()
            .spot_detail
            .as_ref()
            .is_some_and(|d| d.spot.spot_id() == id);
        if open {
            let _ = self.load_spot(id).await;
        }
    }

    /// Reload the lists and the user record after a confirmed change.
    /// Refresh failures are reported by the fetch commands.
    pub(crate) async fn refresh_after_change(&self) {
        let _ = self.fetch_spots().await;
        let _ = self.fetch_user_spots().await;
        let _ = self.refresh_user().await;
    }
}
