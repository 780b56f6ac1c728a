//! Lucene search indexes and geospatial indexes.

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpMethod};
use crate::models::{GeoIndexInformation, GeoResult, OkResult, SearchInfoResult, SearchQuery, SearchResult};
use crate::request::{require, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostSearchOptions {
    pub db: String,
    pub ddoc: String,
    pub index: String,
    #[serde(flatten)]
    pub query: SearchQuery,
}

impl PostSearchOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        require("index", &self.index)?;
        require("query", &self.query.query)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_design/{ddoc}/_search/{index}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .path_param("index", &self.index)
            .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetSearchInfoOptions {
    pub db: String,
    pub ddoc: String,
    pub index: String,
}

impl GetSearchInfoOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        require("index", &self.index)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_design/{ddoc}/_search_info/{index}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .path_param("index", &self.index))
    }
}

/// Geospatial query. Exactly one of `bbox`, `g`, `radius` (with `lat` and
/// `lon`), or `rangex`/`rangey` (with `lat` and `lon`) selects the area.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetGeoOptions {
    pub db: String,
    pub ddoc: String,
    pub index: String,
    /// `min_lon,min_lat,max_lon,max_lat`.
    pub bbox: Option<String>,
    pub bookmark: Option<String>,
    /// `legacy`, `geojson`, `view`, or `application/vnd.geo+json`.
    pub format: Option<String>,
    /// A WKT geometry.
    pub g: Option<String>,
    pub include_docs: Option<bool>,
    pub lat: Option<f64>,
    pub limit: Option<u64>,
    pub lon: Option<f64>,
    pub nearest: Option<bool>,
    /// Metres.
    pub radius: Option<f64>,
    pub rangex: Option<f64>,
    pub rangey: Option<f64>,
    pub relation: Option<String>,
    pub skip: Option<u64>,
    pub stale: Option<String>,
}

impl GetGeoOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        require("index", &self.index)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_design/{ddoc}/_geo/{index}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .path_param("index", &self.index)
            .query("bbox", self.bbox.as_deref())
            .query("bookmark", self.bookmark.as_deref())
            .query("format", self.format.as_deref())
            .query("g", self.g.as_deref())
            .query("include_docs", self.include_docs)
            .query("lat", self.lat)
            .query("limit", self.limit)
            .query("lon", self.lon)
            .query("nearest", self.nearest)
            .query("radius", self.radius)
            .query("rangex", self.rangex)
            .query("rangey", self.rangey)
            .query("relation", self.relation.as_deref())
            .query("skip", self.skip)
            .query("stale", self.stale.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostGeoCleanupOptions {
    pub db: String,
}

impl PostGeoCleanupOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Post, "/{db}/_geo_cleanup").path_param("db", &self.db))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetGeoIndexInformationOptions {
    pub db: String,
    pub ddoc: String,
    pub index: String,
}

impl GetGeoIndexInformationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        require("index", &self.index)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_design/{ddoc}/_geo_info/{index}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .path_param("index", &self.index))
    }
}

impl CloudantClient {
    pub fn post_search(&self, options: &PostSearchOptions) -> Result<ServiceResponse<SearchResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_search_as_stream(
        &self,
        options: &PostSearchOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn get_search_info(
        &self,
        options: &GetSearchInfoOptions,
    ) -> Result<ServiceResponse<SearchInfoResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_geo(&self, options: &GetGeoOptions) -> Result<ServiceResponse<GeoResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_geo_as_stream(&self, options: &GetGeoOptions) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    /// Remove stale geospatial index files. Answers 202.
    pub fn post_geo_cleanup(&self, options: &PostGeoCleanupOptions) -> Result<ServiceResponse<OkResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_geo_index_information(
        &self,
        options: &GetGeoIndexInformationOptions,
    ) -> Result<ServiceResponse<GeoIndexInformation>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}
