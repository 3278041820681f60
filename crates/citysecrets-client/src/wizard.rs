//! Three-step spot creation form: info, then location, then photos.

use citysecrets_shared::validation::{
    validate_form, validate_info, validate_location, validate_photos, SpotDraft, SpotForm,
};
use citysecrets_shared::{PhotoUpload, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Info,
    Location,
    Photos,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] = [Self::Info, Self::Location, Self::Photos];

    pub fn title(self) -> &'static str {
        match self {
            Self::Info => "Basic Info",
            Self::Location => "Location",
            Self::Photos => "Photos",
        }
    }

    fn check(self, form: &SpotForm) -> Result<(), ValidationError> {
        match self {
            Self::Info => validate_info(form),
            Self::Location => validate_location(form),
            Self::Photos => validate_photos(form),
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Info => Some(Self::Location),
            Self::Location => Some(Self::Photos),
            Self::Photos => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::Info => None,
            Self::Location => Some(Self::Info),
            Self::Photos => Some(Self::Location),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateSpotWizard {
    step: WizardStep,
    form: SpotForm,
    error: Option<ValidationError>,
}

impl CreateSpotWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Info,
            form: SpotForm::default(),
            error: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &SpotForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SpotForm {
        &mut self.form
    }

    /// Message of the last failed check, cleared by the next success.
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn add_photo(&mut self, photo: PhotoUpload) {
        self.form.photos.push(photo);
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<PhotoUpload> {
        (index < self.form.photos.len()).then(|| self.form.photos.remove(index))
    }

    /// Validate the current step and move forward.  On the last step this
    /// only validates.
    pub fn next(&mut self) -> Result<WizardStep, ValidationError> {
        self.record(self.step.check(&self.form))?;
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Step back without validating.
    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
        self.error = None;
        self.step
    }

    /// Validate every step in order.  On failure the wizard jumps to the
    /// step holding the offending field.
    pub fn submit(&mut self) -> Result<SpotDraft, ValidationError> {
        for step in WizardStep::ALL {
            if let Err(e) = step.check(&self.form) {
                self.step = step;
                self.error = Some(e.clone());
                return Err(e);
            }
        }
        self.record(validate_form(&self.form))
    }

    /// Start over with an empty form.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn record<T>(&mut self, result: Result<T, ValidationError>) -> Result<T, ValidationError> {
        self.error = result.as_ref().err().cloned();
        result
    }
}

impl Default for CreateSpotWizard {
    fn default() -> Self {
        Self::new()
    }
}
