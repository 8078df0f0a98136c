use chrono::NaiveDate;

use crate::data::collection::FeatureCollection;
use crate::data::image::Image;
use crate::query::expr::Expr;
use crate::query::filter::Filter;
use crate::query::reducer::Reducer;

/// Handle to a platform-side time series of rasters sharing a band schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection {
    expr: Expr,
}

impl ImageCollection {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        ImageCollection { expr }
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Lazy handle for a named imagery catalog.
    pub fn load(catalog_id: &str) -> Self {
        ImageCollection::from_expr(Expr::call(
            "ImageCollection.load",
            [("id", Expr::constant(catalog_id))],
        ))
    }

    /// Retain the images matching `filter` (e.g. `"CLOUD_COVER < 1"`).
    pub fn filter(&self, filter: impl Into<Filter>) -> ImageCollection {
        ImageCollection::from_expr(Expr::call(
            "Collection.filter",
            [
                ("collection", self.expr.clone()),
                ("filter", filter.into().into_expr()),
            ],
        ))
    }

    /// Retain the images acquired within `[start, end)`.
    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> ImageCollection {
        self.filter(Filter::date_range(start, end))
    }

    /// Retain the images intersecting a feature collection's merged geometry.
    pub fn filter_bounds(&self, reference: &FeatureCollection) -> ImageCollection {
        self.filter(Filter::bounds(&reference.geometry()))
    }

    /// Apply `op` to every image, preserving order and cardinality. When the
    /// callback derives the same band set for every image (as the index
    /// computation does), the mapped collection satisfies the schema
    /// alignment the composite reducer requires.
    pub fn map(&self, op: impl FnOnce(&Image) -> Image) -> ImageCollection {
        let body = op(&Image::var("image"));
        ImageCollection::from_expr(Expr::call(
            "Collection.map",
            [
                ("collection", self.expr.clone()),
                ("function", Expr::function("image", body.expr().clone())),
            ],
        ))
    }

    /// Reduce the time series to a single image, per pixel per band.
    /// Precondition (platform-enforced): every image carries the same band
    /// count and order.
    pub fn reduce(&self, reducer: Reducer) -> Image {
        Image::from_expr(Expr::call(
            "ImageCollection.reduce",
            [
                ("collection", self.expr.clone()),
                ("reducer", reducer.expr().clone()),
            ],
        ))
    }

    /// The first image of the collection, in the platform's catalog order.
    pub fn first(&self) -> Image {
        Image::from_expr(Expr::call(
            "Collection.first",
            [("collection", self.expr.clone())],
        ))
    }
}
