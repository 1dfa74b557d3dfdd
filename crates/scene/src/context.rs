use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use environment::{Lighting, SceneEnvironment, WeatherSettings};
use foundation::{GeoPoint, local_input_to_utc, utc_to_local_input};
use tracing::{debug, info};

use crate::error::SceneError;
use crate::import::ObjectSymbol;
use crate::widgets::{WidgetHost, WidgetKind, WidgetRegistry};

/// Camera framing used when the view centers on the user's position.
pub const LOCATE_ZOOM: f64 = 20.0;
pub const LOCATE_TILT: f64 = 45.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub target: GeoPoint,
    pub zoom: f64,
    pub tilt: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedModel {
    pub id: ModelId,
    pub symbol: ObjectSymbol,
    pub location: GeoPoint,
}

/// Viewer state shared by every component that touches the scene.
#[derive(Debug)]
pub struct SceneContext<W> {
    environment: SceneEnvironment,
    camera: Option<Camera>,
    models: BTreeMap<ModelId, PlacedModel>,
    next_model: u32,
    widgets: WidgetRegistry<W>,
}

impl<W> SceneContext<W> {
    pub fn new(now: DateTime<Utc>, widgets: WidgetRegistry<W>) -> Self {
        Self {
            environment: SceneEnvironment::clear_at(now),
            camera: None,
            models: BTreeMap::new(),
            next_model: 0,
            widgets,
        }
    }

    pub fn environment(&self) -> &SceneEnvironment {
        &self.environment
    }

    pub fn apply_environment(&mut self, environment: SceneEnvironment) {
        info!(
            "scene environment: {:?} weather, sun at {}",
            environment.weather.kind,
            environment.lighting.date()
        );
        self.environment = environment;
    }

    pub fn apply_weather(&mut self, weather: WeatherSettings) {
        self.environment.weather = weather;
    }

    pub fn lighting_date(&self) -> DateTime<Utc> {
        self.environment.lighting.date()
    }

    pub fn set_lighting_date(&mut self, date: DateTime<Utc>) {
        self.environment.lighting = Lighting::Sun { date };
    }

    /// Set the sun from a `datetime-local` value read in `tz`.
    pub fn set_lighting_input<Tz: TimeZone>(&mut self, input: &str, tz: &Tz) -> Result<(), SceneError> {
        let date = local_input_to_utc(input, tz)?;
        self.set_lighting_date(date);
        Ok(())
    }

    pub fn lighting_input<Tz: TimeZone>(&self, tz: &Tz) -> String {
        utc_to_local_input(&self.lighting_date(), tz)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Where the view is looking, used as the weather lookup location.
    pub fn location(&self) -> Option<GeoPoint> {
        self.camera.map(|c| c.target)
    }

    pub fn center_on(&mut self, point: GeoPoint) -> Result<&Camera, SceneError> {
        if !point.is_valid() {
            return Err(SceneError::InvalidLocation(format!("{},{}", point.lat, point.lon)));
        }
        Ok(self.camera.insert(Camera {
            target: point,
            zoom: LOCATE_ZOOM,
            tilt: LOCATE_TILT,
        }))
    }

    pub fn place_model(&mut self, symbol: ObjectSymbol, location: GeoPoint) -> Result<ModelId, SceneError> {
        if !location.is_valid() {
            return Err(SceneError::InvalidLocation(format!(
                "{},{}",
                location.lat, location.lon
            )));
        }
        let id = ModelId(self.next_model);
        self.next_model += 1;
        debug!("placed {:?} at {},{}", symbol.href(), location.lat, location.lon);
        self.models.insert(
            id,
            PlacedModel {
                id,
                symbol,
                location,
            },
        );
        Ok(id)
    }

    pub fn remove_model(&mut self, id: ModelId) -> Option<PlacedModel> {
        self.models.remove(&id)
    }

    /// Placed models in placement order.
    pub fn models(&self) -> impl Iterator<Item = &PlacedModel> {
        self.models.values()
    }

    pub fn widgets(&self) -> &WidgetRegistry<W> {
        &self.widgets
    }

    pub fn active_widget(&self) -> Option<WidgetKind> {
        self.widgets.active()
    }

    pub fn switch_widget<H: WidgetHost<W>>(
        &mut self,
        host: &mut H,
        target: Option<WidgetKind>,
    ) -> Result<Option<WidgetKind>, SceneError> {
        self.widgets.switch(host, target)
    }

    /// Release everything tied to the view: widgets and placed models.
    pub fn teardown<H: WidgetHost<W>>(&mut self, host: &mut H) {
        self.widgets.teardown(host);
        self.models.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ModelSource;
    use crate::widgets::Teardown;
    use crate::widgets::tests::RecordingHost;
    use chrono::FixedOffset;
    use environment::{WeatherKind, classify_forecast};
    use pretty_assertions::assert_eq;

    type Ctx = SceneContext<(WidgetKind, u32)>;

    fn context() -> Ctx {
        let now = DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        SceneContext::new(now, WidgetRegistry::default())
    }

    #[test]
    fn starts_clear_at_now() {
        let ctx = context();
        assert_eq!(ctx.environment().weather.kind, WeatherKind::Sunny);
        assert_eq!(ctx.lighting_date().to_rfc3339(), "2024-06-15T12:00:00+00:00");
        assert!(ctx.location().is_none());
    }

    #[test]
    fn lighting_input_round_trips_in_zone() {
        let pdt = FixedOffset::west_opt(7 * 3600).unwrap();
        let mut ctx = context();
        ctx.set_lighting_input("2024-06-15T14:30", &pdt).unwrap();
        assert_eq!(ctx.lighting_date().to_rfc3339(), "2024-06-15T21:30:00+00:00");
        assert_eq!(ctx.lighting_input(&pdt), "2024-06-15T14:30");

        let err = ctx.set_lighting_input("yesterday", &pdt).unwrap_err();
        assert!(matches!(err, SceneError::Time(_)));
        assert_eq!(ctx.lighting_input(&pdt), "2024-06-15T14:30");
    }

    #[test]
    fn weather_keeps_lighting() {
        let mut ctx = context();
        let before = ctx.lighting_date();
        ctx.apply_weather(classify_forecast("Heavy Snow"));
        assert_eq!(ctx.environment().weather.kind, WeatherKind::Snowy);
        assert_eq!(ctx.lighting_date(), before);
    }

    #[test]
    fn centering_uses_locate_framing() {
        let mut ctx = context();
        let camera = *ctx.center_on(GeoPoint::new(37.7749, -122.4194)).unwrap();
        assert_eq!((camera.zoom, camera.tilt), (20.0, 45.0));
        assert_eq!(ctx.location(), Some(GeoPoint::new(37.7749, -122.4194)));
        assert!(ctx.center_on(GeoPoint::new(0.0, 200.0)).is_err());
    }

    #[test]
    fn models_are_placed_and_removed() {
        let mut ctx = context();
        let here = GeoPoint::new(40.0, -105.0);
        let symbol = ModelSource::Uploaded {
            url: "/models/a.glb".to_string(),
        }
        .symbol();
        let a = ctx.place_model(symbol.clone(), here).unwrap();
        let b = ctx.place_model(symbol, here).unwrap();
        assert_ne!(a, b);

        assert_eq!(ctx.remove_model(a).map(|m| m.id), Some(a));
        assert!(ctx.remove_model(a).is_none());
        let ids: Vec<ModelId> = ctx.models().map(|m| m.id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn teardown_releases_widgets_and_models() {
        let mut host = RecordingHost::default();
        let mut ctx: Ctx = SceneContext::new(Utc::now(), WidgetRegistry::new(Teardown::Keep));
        ctx.switch_widget(&mut host, Some(WidgetKind::Daylight)).unwrap();
        ctx.place_model(ObjectSymbol::for_model("/static/tree.glb", Some(5.0)), GeoPoint::new(1.0, 1.0))
            .unwrap();

        ctx.teardown(&mut host);
        assert_eq!(ctx.active_widget(), None);
        assert_eq!(ctx.models().count(), 0);
        assert_eq!(host.events.last().map(String::as_str), Some("destroy daylight#1"));
    }
}
