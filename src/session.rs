//! Request orchestration and the view state a front end renders.
//!
//! A session owns everything the page used to keep in globals: the selected file,
//! control enablement, the busy indicator, the names panel and the current overlays.
//! Exactly one request may be in flight; busy and disabled state are reverted in
//! [`RecognitionSession::finish`] whatever the outcome.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};
use tracing::{debug, info, warn};

use crate::client::RecognitionService;
use crate::error::{RecognitionError, RenderError, SessionError};
use crate::params::RecognitionParams;
use crate::protocol::{classify, RecognitionSuccess};
use crate::render::{
    draw_overlays, render, DisplayLayout, HoverTarget, ImageDimensions, OverlayStyle, RenderedAnnotations,
};
use crate::upload::SelectedFile;

pub const NO_FACES_TEXT: &str = "No faces found meeting criteria.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Upload,
    Reprocess,
}

impl RequestKind {
    pub fn busy_text(&self) -> &'static str {
        match self {
            RequestKind::Upload => "Uploading and processing...",
            RequestKind::Reprocess => "Re-processing with new settings...",
        }
    }
}

/// A started request: what to send and with which parameters.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub file: SelectedFile,
    pub params: RecognitionParams,
}

/// Text of the names panel. Errors are styled differently from plain status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelStatus {
    pub text: String,
    pub is_error: bool,
}

impl PanelStatus {
    pub fn info(text: impl Into<String>) -> PanelStatus {
        PanelStatus { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> PanelStatus {
        PanelStatus { text: text.into(), is_error: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub results_visible: bool,
    pub image_name: String,
    pub image_url: Option<String>,
    /// Size the image is shown at; overlays are in this space.
    pub display_size: ImageDimensions,
    pub stats: String,
    pub panel: PanelStatus,
    pub annotations: RenderedAnnotations,
}

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub url: String,
    pub image: DynamicImage,
}

pub struct RecognitionSession<S> {
    service: S,
    params: RecognitionParams,
    current_file: Option<SelectedFile>,
    in_flight: bool,
    controls_enabled: bool,
    busy: Option<&'static str>,
    reprocess_visible: bool,
    view: ViewState,
    pending: Option<RecognitionSuccess>,
    image: Option<LoadedImage>,
}

impl<S: RecognitionService> RecognitionSession<S> {
    pub fn new(service: S, params: RecognitionParams) -> RecognitionSession<S> {
        RecognitionSession {
            service,
            params,
            current_file: None,
            in_flight: false,
            controls_enabled: true,
            busy: None,
            reprocess_visible: false,
            view: ViewState::default(),
            pending: None,
            image: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn params(&self) -> &RecognitionParams {
        &self.params
    }

    pub fn current_file(&self) -> Option<&SelectedFile> {
        self.current_file.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    /// Busy indicator text while a request is pending.
    pub fn busy_text(&self) -> Option<&'static str> {
        self.busy
    }

    pub fn reprocess_visible(&self) -> bool {
        self.reprocess_visible
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Most recently loaded image, replaced on every reply that carries one.
    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn set_params(&mut self, params: RecognitionParams) -> Result<(), SessionError> {
        if !self.controls_enabled {
            return Err(SessionError::ControlsDisabled);
        }
        self.params = params;
        Ok(())
    }

    /// A new file choice. `None` clears the selection; a file starts an upload.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Result<Option<RequestTicket>, SessionError> {
        if self.in_flight {
            return Err(SessionError::RequestInFlight);
        }
        let Some(file) = file else {
            self.current_file = None;
            self.reprocess_visible = false;
            return Ok(None);
        };
        if let Err(err) = file.check_size() {
            warn!("{} rejected: {}", file.name(), err);
            self.current_file = None;
            self.reprocess_visible = false;
            return Err(err);
        }
        self.current_file = Some(file.clone());
        Ok(Some(self.begin(RequestKind::Upload, file)))
    }

    /// Re-submits the current file with the current parameters.
    pub fn reprocess(&mut self) -> Result<RequestTicket, SessionError> {
        if self.in_flight {
            return Err(SessionError::RequestInFlight);
        }
        let file = self.current_file.clone().ok_or(SessionError::NoFileSelected)?;
        Ok(self.begin(RequestKind::Reprocess, file))
    }

    fn begin(&mut self, kind: RequestKind, file: SelectedFile) -> RequestTicket {
        info!("{:?} {} ({} bytes)", kind, file.name(), file.size());
        self.in_flight = true;
        self.controls_enabled = false;
        self.busy = Some(kind.busy_text());
        self.view.results_visible = false;
        self.pending = None;
        RequestTicket { kind, file, params: self.params }
    }

    /// Ends the in-flight request. Returns the image url to load next, if any.
    pub fn finish(
        &mut self,
        ticket: &RequestTicket,
        outcome: Result<RecognitionSuccess, RecognitionError>,
    ) -> Option<String> {
        self.in_flight = false;
        self.busy = None;
        self.controls_enabled = true;
        self.reprocess_visible = self.current_file.is_some();

        match outcome {
            Ok(success) => {
                info!("{} face(s) for {}", success.annotations.len(), success.original_filename);
                self.view.results_visible = true;
                self.view.image_name = success.original_filename.clone();
                self.view.image_url = success.image_url.clone();
                self.view.annotations = RenderedAnnotations::default();
                self.view.display_size = ImageDimensions::default();
                self.image = None;
                let image_url = success.image_url.clone();
                self.pending = Some(success);
                image_url
            }
            Err(err) => {
                warn!("{}", err);
                let file_name = err.original_filename().unwrap_or(ticket.file.name()).to_owned();
                self.show_error(&err.to_string(), &file_name, err.image_url());
                err.image_url().map(str::to_owned)
            }
        }
    }

    fn show_error(&mut self, message: &str, file_name: &str, image_url: Option<&str>) {
        self.view.results_visible = true;
        self.view.image_name = format!("Error with: {file_name}");
        self.view.panel = PanelStatus::error(message);
        self.view.stats.clear();
        self.view.annotations = RenderedAnnotations::default();
        self.view.image_url = image_url.map(str::to_owned);
        self.view.display_size = ImageDimensions::default();
        self.image = None;
        self.pending = None;
    }

    /// Called once the reply's image is decoded and laid out.
    pub fn image_loaded(
        &mut self,
        native: ImageDimensions,
        rendered: ImageDimensions,
    ) -> Result<&RenderedAnnotations, RenderError> {
        self.view.display_size = rendered;
        let Some(success) = self.pending.take() else {
            return Ok(&self.view.annotations);
        };
        let found = success.annotations.len();
        self.view.stats = success.message.clone().unwrap_or_else(|| format!("Found {found} face(s)."));

        match render(&success.annotations, native, rendered) {
            Ok(annotations) => {
                self.view.annotations = annotations;
                self.view.panel = PanelStatus::info(if found > 0 { "" } else { NO_FACES_TEXT });
                Ok(&self.view.annotations)
            }
            Err(err) => {
                warn!("{} (native {:?})", err, native);
                self.view.annotations = RenderedAnnotations::default();
                self.view.panel = PanelStatus::error(err.to_string());
                Err(err)
            }
        }
    }

    pub fn hover_enter(&mut self, target: HoverTarget) {
        self.view.annotations.hover_enter(target);
    }

    pub fn hover_leave(&mut self, target: HoverTarget) {
        self.view.annotations.hover_leave(target);
    }

    /// Sends the ticket's request and drives the view through to rendered overlays.
    ///
    /// Failures are already shown in the view when this returns; the result is for
    /// callers that also want to report them. Returns the number of faces on success.
    /// A reply whose annotations cannot be scaled still counts as a success here: the
    /// dimension error only reaches the names panel, and `view().annotations` is empty.
    pub async fn run(&mut self, ticket: RequestTicket, layout: &DisplayLayout) -> Result<usize, RecognitionError> {
        let outcome = self
            .service
            .recognize(&ticket.file, &ticket.params)
            .await
            .and_then(|reply| classify(reply, ticket.file.name()));
        let result = match &outcome {
            Ok(success) => Ok(success.annotations.len()),
            Err(err) => Err(err.clone()),
        };

        let native = match self.finish(&ticket, outcome) {
            Some(url) => self.load_image(&url).await,
            None => ImageDimensions::default(),
        };
        let rendered = layout.fit(native);
        self.view.display_size = rendered;
        if self.pending.is_some() {
            if let Err(err) = self.image_loaded(native, rendered) {
                debug!("{} face(s) left unplaced: {}", result.as_ref().map_or(0, |n| *n), err);
            }
        }
        result
    }

    async fn load_image(&mut self, url: &str) -> ImageDimensions {
        let decoded = match self.service.fetch_image(url).await {
            Ok(bytes) => image::load_from_memory(&bytes).map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match decoded {
            Ok(image) => {
                let (width, height) = image.dimensions();
                debug!("loaded {} at {}x{}", url, width, height);
                self.image = Some(LoadedImage { url: url.to_owned(), image });
                ImageDimensions::new(width, height)
            }
            Err(err) => {
                warn!("could not load {}: {}", url, err);
                self.image = None;
                ImageDimensions::default()
            }
        }
    }

    /// The loaded image at display size with overlays drawn on top.
    pub fn compose(&self, style: &OverlayStyle) -> Option<RgbaImage> {
        let loaded = self.image.as_ref()?;
        let size = self.view.display_size;
        let mut canvas = if size.is_empty() || (size.width, size.height) == loaded.image.dimensions() {
            loaded.image.to_rgba8()
        } else {
            loaded.image.resize_exact(size.width, size.height, FilterType::Triangle).to_rgba8()
        };
        draw_overlays(&mut canvas, &self.view.annotations, style);
        Some(canvas)
    }
}
