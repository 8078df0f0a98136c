use std::collections::BTreeMap;

use crate::data::collection::FeatureCollection;
use crate::data::geometry::Geometry;
use crate::data::primitive::{Dictionary, List};
use crate::query::expr::Expr;
use crate::query::reducer::Reducer;

/// Handle to a platform-side raster with named bands.
///
/// Band math and band selection build new image handles; pixels are never
/// pulled into the local process except through [`Image::sample`] followed by
/// a tabular materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    expr: Expr,
}

impl Image {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Image { expr }
    }

    pub(crate) fn var(param: &str) -> Self {
        Image::from_expr(Expr::Ref(param.to_string()))
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Keep only the named bands. Selectors may be band names or the
    /// platform's name-prefix patterns (e.g. `"B.*"`); an empty selection
    /// yields a bandless image to append onto.
    pub fn select(&self, selectors: &[&str]) -> Image {
        Image::from_expr(Expr::call(
            "Image.select",
            [
                ("image", self.expr.clone()),
                (
                    "bandSelectors",
                    Expr::constant(
                        selectors
                            .iter()
                            .map(|s| serde_json::Value::from(*s))
                            .collect::<Vec<_>>(),
                    ),
                ),
            ],
        ))
    }

    fn binary(&self, name: &str, rhs: &Image) -> Image {
        Image::from_expr(Expr::call(
            name,
            [("left", self.expr.clone()), ("right", rhs.expr.clone())],
        ))
    }

    pub fn add(&self, rhs: &Image) -> Image {
        self.binary("Image.add", rhs)
    }

    pub fn subtract(&self, rhs: &Image) -> Image {
        self.binary("Image.subtract", rhs)
    }

    pub fn divide(&self, rhs: &Image) -> Image {
        self.binary("Image.divide", rhs)
    }

    /// Rename the bands. Accepts a literal slice or a computed name list
    /// (e.g. the band names of another image).
    pub fn rename(&self, names: impl Into<List>) -> Image {
        Image::from_expr(Expr::call(
            "Image.rename",
            [
                ("image", self.expr.clone()),
                ("names", names.into().expr().clone()),
            ],
        ))
    }

    /// Append the bands of each image in order, left to right.
    pub fn add_bands(&self, bands: &[&Image]) -> Image {
        bands.iter().fold(self.clone(), |acc, band| {
            Image::from_expr(Expr::call(
                "Image.addBands",
                [("dstImg", acc.expr.clone()), ("srcImg", band.expr.clone())],
            ))
        })
    }

    /// Evaluate a named band expression over the bound input images, e.g.
    /// `"nbr = (nir - swir2) / (nir + swir2)"` with `nir`/`swir2` bindings.
    pub fn expression(source: &str, bindings: &[(&str, &Image)]) -> Image {
        let vars: BTreeMap<String, Expr> = bindings
            .iter()
            .map(|(name, image)| (name.to_string(), image.expr.clone()))
            .collect();
        Image::from_expr(Expr::call(
            "Image.expression",
            [
                ("expression", Expr::constant(source)),
                ("arguments", Expr::Dict(vars)),
            ],
        ))
    }

    /// The image's band-name list, as a platform-side value.
    pub fn band_names(&self) -> List {
        List::from_expr(Expr::call(
            "Image.bandNames",
            [("image", self.expr.clone())],
        ))
    }

    /// Restrict the image to a geometry's footprint.
    pub fn clip(&self, geometry: &Geometry) -> Image {
        Image::from_expr(Expr::call(
            "Image.clip",
            [
                ("image", self.expr.clone()),
                ("geometry", geometry.expr().clone()),
            ],
        ))
    }

    /// Zonal statistic: reduce all pixels whose centers fall inside
    /// `geometry`, per band, at `scale_m` meters per pixel. `max_pixels` is a
    /// safety cap enforced by the platform; exceeding it is a platform error,
    /// not handled here.
    pub fn reduce_region(
        &self,
        reducer: Reducer,
        geometry: &Geometry,
        scale_m: f64,
        max_pixels: f64,
    ) -> Dictionary {
        Dictionary::from_expr(Expr::call(
            "Image.reduceRegion",
            [
                ("image", self.expr.clone()),
                ("reducer", reducer.expr().clone()),
                ("geometry", geometry.expr().clone()),
                ("scale", Expr::constant(scale_m)),
                ("maxPixels", Expr::constant(max_pixels)),
            ],
        ))
    }

    /// Draw `num_pixels` random pixels within `region` at `scale_m` meters
    /// per pixel, as a feature collection with one row of band values per
    /// sampled pixel. Distribution is platform-defined; regions smaller than
    /// the request yield fewer rows.
    pub fn sample(&self, region: &Geometry, scale_m: f64, num_pixels: u32) -> FeatureCollection {
        FeatureCollection::from_expr(Expr::call(
            "Image.sample",
            [
                ("image", self.expr.clone()),
                ("region", region.expr().clone()),
                ("scale", Expr::constant(scale_m)),
                ("numPixels", Expr::constant(num_pixels)),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalized_difference_graph() {
        let image = Image::var("image");
        let nir = image.select(&["B5"]);
        let red = image.select(&["B4"]);
        let ndvi = nir.subtract(&red).divide(&nir.add(&red)).rename(&["ndvi"][..]);

        let encoded = ndvi.expr().encode();
        assert_eq!(encoded["functionName"], "Image.rename");
        assert_eq!(
            encoded["arguments"]["names"],
            json!({ "constantValue": ["ndvi"] })
        );
        let ratio = &encoded["arguments"]["image"];
        assert_eq!(ratio["functionName"], "Image.divide");
        assert_eq!(ratio["arguments"]["left"]["functionName"], "Image.subtract");
        assert_eq!(ratio["arguments"]["right"]["functionName"], "Image.add");
    }

    #[test]
    fn test_expression_bindings() {
        let image = Image::var("image");
        let nbr = Image::expression(
            "nbr = (nir - swir2) / (nir + swir2)",
            &[("nir", &image.select(&["B5"])), ("swir2", &image.select(&["B7"]))],
        );

        let encoded = nbr.expr().encode();
        assert_eq!(encoded["functionName"], "Image.expression");
        let vars = &encoded["arguments"]["arguments"]["dictionaryValue"];
        assert_eq!(vars["nir"]["functionName"], "Image.select");
        assert_eq!(vars["swir2"]["functionName"], "Image.select");
    }

    #[test]
    fn test_add_bands_folds_left_to_right() {
        let image = Image::var("image");
        let ndvi = image.select(&["B5"]).rename(&["ndvi"][..]);
        let nbr = image.select(&["B7"]).rename(&["nbr"][..]);
        let stacked = image
            .select(&[])
            .add_bands(&[&ndvi, &nbr])
            .add_bands(&[&image.select(&["B.*"])]);

        let encoded = stacked.expr().encode();
        // Outermost append is the B-prefixed source bands.
        assert_eq!(encoded["functionName"], "Image.addBands");
        assert_eq!(
            encoded["arguments"]["srcImg"]["arguments"]["bandSelectors"],
            json!({ "constantValue": ["B.*"] })
        );
        assert_eq!(
            encoded["arguments"]["dstImg"]["functionName"],
            "Image.addBands"
        );
    }

    #[test]
    fn test_sample_request_shape() {
        let image = Image::var("image");
        let region = Geometry::point(geo::Point::new(0.0, 0.0)).buffer(1000.0, 1.0);
        let sample = image.sample(&region, 30.0, 1000);

        let encoded = sample.expr().encode();
        assert_eq!(encoded["functionName"], "Image.sample");
        assert_eq!(encoded["arguments"]["scale"], json!({ "constantValue": 30.0 }));
        assert_eq!(
            encoded["arguments"]["numPixels"],
            json!({ "constantValue": 1000 })
        );
    }
}
