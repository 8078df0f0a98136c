use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::data::collection::FeatureCollection;
use crate::data::geometry::Geometry;
use crate::data::image::Image;
use crate::data::image_collection::ImageCollection;
use crate::engine::session::Session;
use crate::query::filter::Filter;
use crate::query::join::Join;
use crate::query::reducer::Reducer;
use crate::report::chart::Chart;

/// Platform project the session is established against.
pub const PROJECT_ID: &str = "zhubas-project";

// Catalog identifiers: opaque keys into the platform's dataset catalog.
pub const ADMIN_BOUNDARIES: &str = "FAO/GAUL/2015/level0";
pub const BASINS_LEVEL6: &str = "WWF/HydroATLAS/v1/Basins/level06";
pub const FREE_FLOWING_RIVERS: &str = "WWF/HydroSHEDS/v1/FreeFlowingRivers";
pub const CENSUS_TRACTS: &str = "TIGER/2020/TRACT";
pub const LANDSAT9_TOA: &str = "LANDSAT/LC09/C02/T1_TOA";

/// HydroATLAS identifier of the Walla Walla Basin.
pub const WAWA_BASIN_ID: i64 = 7060382460;

/// Central Walla Walla, Washington; reference point for distance queries.
pub const STUDY_POINT_LON: f64 = -118.3430;
pub const STUDY_POINT_LAT: f64 = 46.0646;

/// Stream orders at or below this value are treated as main channels.
pub const MAIN_CHANNEL_FILTER: &str = "RIV_ORD <= 6";

const RIVER_PROXIMITY_M: f64 = 10e3;
const RIPARIAN_BUFFER_M: f64 = 100.0;
const GEOMETRY_MAX_ERROR_M: f64 = 1.0;

const SEASON_START: NaiveDate = season_date(2022, 4, 1);
const SEASON_END: NaiveDate = season_date(2022, 11, 1);
const CLOUD_FILTER: &str = "CLOUD_COVER < 1";

const ZONAL_SCALE_M: f64 = 100.0;
const ZONAL_MAX_PIXELS: f64 = 2e8;
const SAMPLE_SCALE_M: f64 = 30.0;
const SAMPLE_PIXELS: u32 = 1000;

pub const NDVI_HISTOGRAM_FILE: &str = "ndvi_histogram.html";
pub const B4_B5_SCATTER_FILE: &str = "b4_b5_scatter.html";

/// Summary statistics of one analysis run; the binary prints these as the
/// run's console report.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinReport {
    pub mean_distance_km: f64,
    pub main_channel_percentage: f64,
    pub median_riparian_ndvi: f64,
    pub median_upland_ndvi: f64,
    pub sampled_pixels: usize,
    pub charts: Vec<PathBuf>,
}

fn study_point() -> Geometry {
    Geometry::point(geo::Point::new(STUDY_POINT_LON, STUDY_POINT_LAT))
}

// Evaluated at compile time, so an invalid calendar date cannot reach a run.
const fn season_date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid season date"),
    }
}

/// NDVI and NBR per image: the two index bands followed by the B-prefixed
/// source bands, and nothing else.
fn calc_indices(image: &Image) -> Image {
    let nir = image.select(&["B5"]);
    let red = image.select(&["B4"]);
    let ndvi = nir
        .subtract(&red)
        .divide(&nir.add(&red))
        .rename(&["ndvi"][..]);

    let nbr = Image::expression(
        "nbr = (nir - swir2) / (nir + swir2)",
        &[("nir", &image.select(&["B5"])), ("swir2", &image.select(&["B7"]))],
    )
    .rename(&["nbr"][..]);

    image
        .select(&[])
        .add_bands(&[&ndvi, &nbr])
        .add_bands(&[&image.select(&["B.*"])])
}

/// The full basin analysis: vector filtering, channel statistics, riparian
/// and upland delineation, census enrichment, the Landsat composite, zonal
/// medians, and the sampled-pixel charts.
///
/// Chart files are written into `output_dir`. Any platform failure aborts
/// the run; only in-memory handles exist before the materialization points,
/// so nothing partial is persisted.
pub fn run(session: &Session, output_dir: &Path) -> Result<BasinReport> {
    // Vector sources. Administrative boundaries are loaded for parity with
    // the catalog inventory but feed no statistic in the headless run.
    let _admin = FeatureCollection::load(ADMIN_BOUNDARIES);
    let basins = FeatureCollection::load(BASINS_LEVEL6);
    let rivers = FeatureCollection::load(FREE_FLOWING_RIVERS);
    let census_tracts = FeatureCollection::load(CENSUS_TRACTS);
    let wawa = study_point();

    // Study basin, by exact identifier match.
    let wawa_basin = basins.filter(Filter::eq("HYBAS_ID", WAWA_BASIN_ID));

    // Rivers intersecting the basin, and (independently) rivers within 10 km
    // of the study point.
    let wawa_rivers = rivers.filter_bounds(&wawa_basin);
    let _wawa_rivers_close =
        rivers.filter(Filter::within_distance(RIVER_PROXIMITY_M, &wawa, GEOMETRY_MAX_ERROR_M));

    // Stream-order range probe over the basin's rivers.
    let order_range = wawa_rivers.reduce_columns(Reducer::min_max(), &["RIV_ORD"]);
    log::debug!(
        "stream-order range graph built ({} nodes)",
        order_range.expr().node_count()
    );

    // Main channels by stream order.
    let main_rivers = wawa_rivers.filter(MAIN_CHANNEL_FILTER);

    // River length statistics; the ratio is plain local arithmetic over the
    // two fetched sums.
    let total_river_length = wawa_rivers
        .reduce_columns(Reducer::sum(), &["LENGTH_KM"])
        .get_number("sum")
        .fetch(session)
        .context("fetching total river length")?;
    let main_river_length = main_rivers
        .reduce_columns(Reducer::sum(), &["LENGTH_KM"])
        .get_number("sum")
        .fetch(session)
        .context("fetching main-channel river length")?;
    anyhow::ensure!(
        total_river_length.is_finite() && total_river_length > 0.0,
        "total river length is {}; cannot derive the main-channel share",
        total_river_length
    );
    let main_channel_percentage = main_river_length / total_river_length * 100.0;
    log::info!(
        "river length: {:.1} km total, {:.1} km main channels ({:.1}%)",
        total_river_length,
        main_river_length,
        main_channel_percentage
    );

    // Riparian buffer around the main channels, upland as its complement
    // within the basin.
    let riparian = main_rivers.geometry().buffer(RIPARIAN_BUFFER_M, GEOMETRY_MAX_ERROR_M);
    let upland = wawa_basin.geometry().difference(&riparian, GEOMETRY_MAX_ERROR_M);

    // Distance-to-study-point attribute on every river segment, then the
    // mean over the collection.
    let wawa_rivers = wawa_rivers.map(|f| {
        f.set(
            "distance_km",
            f.distance(&wawa, GEOMETRY_MAX_ERROR_M).divide(1000.0),
        )
    });
    let mean_distance_km = wawa_rivers
        .reduce_columns(Reducer::mean(), &["distance_km"])
        .get_number("mean")
        .fetch(session)
        .context("fetching mean river distance")?;

    // Intersection join with census tracts; copy tract code and name onto
    // each river segment. Which tract is "first" among several intersecting
    // ones is the platform's internal ordering.
    let joined = Join::save_first("tract").apply(
        &wawa_rivers,
        &census_tracts,
        Filter::intersects(".geo", ".geo"),
    );
    let enriched_rivers =
        joined.map(|f| f.copy_properties(&f.get("tract"), &["TRACTCE", "NAMELSAD"]));
    log::debug!(
        "census-enriched river graph built ({} nodes)",
        enriched_rivers.expr().node_count()
    );

    // Landsat 9 TOA time series over the basin, near-cloud-free scenes only,
    // with NDVI/NBR computed per image.
    let toa_col = ImageCollection::load(LANDSAT9_TOA)
        .filter_date(SEASON_START, SEASON_END)
        .filter_bounds(&wawa_basin)
        .filter(CLOUD_FILTER)
        .map(calc_indices);

    // Per-pixel maximum composite, clipped to the basin. The index mapping
    // gives every image an identical band schema, which the fixed-arity
    // reducer requires.
    let band_names = toa_col.first().band_names();
    let toa_max = toa_col
        .reduce(Reducer::max_n(band_names.size()))
        .rename(band_names);
    let toa_max_basin = toa_max.clip(&wawa_basin.geometry());

    // Median NDVI inside each derived zone.
    let median_riparian_ndvi = toa_max_basin
        .reduce_region(Reducer::median(), &riparian, ZONAL_SCALE_M, ZONAL_MAX_PIXELS)
        .get_number("ndvi")
        .fetch(session)
        .context("fetching median riparian NDVI")?;
    let median_upland_ndvi = toa_max_basin
        .reduce_region(Reducer::median(), &upland, ZONAL_SCALE_M, ZONAL_MAX_PIXELS)
        .get_number("ndvi")
        .fetch(session)
        .context("fetching median upland NDVI")?;

    // Random pixel sample of the composite, materialized as a table.
    let sample = toa_max_basin.sample(&wawa_basin.geometry(), SAMPLE_SCALE_M, SAMPLE_PIXELS);
    let table = sample
        .to_table(session)
        .context("materializing pixel sample")?;
    log::info!("sampled {} pixels from the composite", table.len());
    if let Ok(df) = table.to_dataframe() {
        log::debug!("sample preview:\n{}", df.head(Some(5)));
    }

    // Exploratory charts, written with fixed filenames.
    let histogram_path = output_dir.join(NDVI_HISTOGRAM_FILE);
    Chart::histogram(&table, "ndvi", "NDVI Distribution")
        .save(&histogram_path)
        .context("saving NDVI histogram")?;
    let scatter_path = output_dir.join(B4_B5_SCATTER_FILE);
    Chart::scatter(&table, "B4", "B5", "Red vs NIR Reflectance")
        .save(&scatter_path)
        .context("saving red/NIR scatter")?;

    Ok(BasinReport {
        mean_distance_km,
        main_channel_percentage,
        median_riparian_ndvi,
        median_upland_ndvi,
        sampled_pixels: table.len(),
        charts: vec![histogram_path, scatter_path],
    })
}
