mod common;

use arrow_array::{Array, Date32Array, Float64Array};
use arrow_schema::DataType;
use common::Fixture;
use datapool_core::error::{ConfigError, FormatError, OptionError, QueryError};
use datapool_core::loaders::{TIME_COLUMN, discover_files};
use datapool_core::time::{date32_days, mid_year_date};
use datapool_core::{
    Availability, CatalogRow, DataCatalog, DataPoolError, ErrorKind, GridArray, GridDataset,
    LoadOptions, LoadedData, LoaderRegistry, Notice, Result,
};
use tiff::encoder::{TiffEncoder, colortype};

fn foo_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture
        .write("foo/v1/a.csv", "id,value\n1,0.5\n")
        .write("foo/v2/a.csv", "id,value\n1,1.5\n2,-9999\n")
        .write("foo/v2/b.csv", "id,value\n3,2.5\n");
    fixture
}

const FOO: &str = "datasets:\n  foo:\n    path: foo\n    extension: csv\n    no_data_value: -9999\n";

#[test]
fn latest_version_loads_all_files_in_order() {
    let fixture = foo_fixture();
    let catalog = fixture.catalog(FOO);

    let data = catalog.load_dataset("foo", None, None, &LoadOptions::new()).unwrap();
    let table = data.as_table().unwrap();
    assert_eq!(table.num_rows(), 3);

    let values = table
        .column_by_name("value")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(values.null_count(), 1);
    assert!(values.is_null(1));
    assert_eq!(values.value(2), 2.5);

    let older = catalog.load_dataset("foo", Some("v1"), None, &LoadOptions::new()).unwrap();
    assert_eq!(older.num_rows(), 1);
}

#[test]
fn options_without_matching_metadata_are_not_applicable() {
    let fixture = foo_fixture();
    let catalog = fixture.catalog(FOO);

    let resolution = catalog
        .load_dataset("foo", None, None, &LoadOptions::new().with_resolution("1km"))
        .unwrap_err();
    assert!(matches!(
        resolution,
        DataPoolError::Options(OptionError::ResolutionNotApplicable { .. })
    ));
    assert!(resolution.is_not_applicable());

    let static_files = catalog
        .load_dataset("foo", None, None, &LoadOptions::new().with_static(true))
        .unwrap_err();
    assert!(matches!(
        static_files,
        DataPoolError::Options(OptionError::StaticNotApplicable { .. })
    ));
}

const VELOCITY: &str = r"
datasets:
  velocity:
    path: velocity
    extension: csv
    static_patterns: [static]
    resolutions:
      v1:
        static: {1km: _1km_, 500m: _500m_}
        annual: {1km: _1km_}
";

fn velocity_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture
        .write("velocity/v1/velocity_static_1km.csv", "x,y\n1,2\n")
        .write("velocity/v1/velocity_static_500m.csv", "x,y\n1,2\n3,4\n")
        .write("velocity/v1/velocity_2019_1km.csv", "x,y\n5,6\n");
    fixture
}

#[test]
fn omitted_options_are_required_when_metadata_exists() {
    let fixture = velocity_fixture();
    let catalog = fixture.catalog(VELOCITY);

    let err = catalog.load_dataset("velocity", None, None, &LoadOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        DataPoolError::Options(OptionError::ResolutionRequired { ref available }) if available == &["1km", "500m"]
    ));
    assert_eq!(err.kind(), ErrorKind::CapabilityMismatch);

    let err = catalog
        .load_dataset("velocity", None, None, &LoadOptions::new().with_resolution("1km"))
        .unwrap_err();
    assert!(matches!(err, DataPoolError::Options(OptionError::StaticRequired)));
}

#[test]
fn resolution_and_mode_select_one_file() {
    let fixture = velocity_fixture();
    let catalog = fixture.catalog(VELOCITY);

    let options = LoadOptions::new().with_resolution("500m").with_static(true);
    let data = catalog.load_dataset("velocity", None, None, &options).unwrap();
    assert_eq!(data.num_rows(), 2);

    let unknown = LoadOptions::new().with_resolution("250m").with_static(true);
    let err = catalog.load_dataset("velocity", None, None, &unknown).unwrap_err();
    assert!(matches!(err, DataPoolError::Options(OptionError::ResolutionNotFound { .. })));
}

#[test]
fn default_loader_refuses_annual_files() {
    let fixture = velocity_fixture();
    let catalog = fixture.catalog(VELOCITY);

    let options = LoadOptions::new().with_resolution("1km").with_static(false);
    let err = catalog.load_dataset("velocity", None, None, &options).unwrap_err();
    assert!(matches!(err, DataPoolError::Options(OptionError::AnnualNotSupported { .. })));
}

#[test]
fn unversioned_dataset_resolutions_fall_back_to_none() {
    let fixture = velocity_fixture();
    let yaml = r"
datasets:
  velocity:
    path: velocity
    extension: csv
    static_patterns: [static]
    resolutions:
      static: {1km: _1km_}
";
    let catalog = fixture.catalog(yaml);

    // At dataset level a mapping is read as keyed by version, and 'static' is not 'v1'.
    let resolutions = catalog.available_resolutions("velocity", None, None).unwrap();
    assert_eq!(resolutions, Availability::Undefined(Notice::NoResolutions));

    let options = LoadOptions::new().with_resolution("1km").with_static(true);
    let err = catalog.load_dataset("velocity", None, None, &options).unwrap_err();
    assert!(matches!(
        err,
        DataPoolError::Options(OptionError::ResolutionNotApplicable { .. })
    ));

    let data = catalog
        .load_dataset("velocity", None, None, &LoadOptions::new().with_static(true))
        .unwrap();
    assert_eq!(data.num_rows(), 3);
}

#[test]
fn subdataset_resolutions_may_be_unversioned() {
    let fixture = Fixture::new();
    fixture
        .write("velocity/v1/grids/velocity_static_1km.csv", "x,y\n1,2\n")
        .write("velocity/v1/grids/velocity_static_500m.csv", "x,y\n1,2\n3,4\n");
    let yaml = r"
datasets:
  velocity:
    path: velocity
    extension: csv
    subdatasets:
      v1:
        grids:
          subpath: grids
          static_patterns: [static]
          resolutions:
            static: {1km: _1km_, 500m: _500m_}
";
    let catalog = fixture.catalog(yaml);

    let options = LoadOptions::new().with_resolution("1km").with_static(true);
    let data = catalog.load_dataset("velocity", None, Some("grids"), &options).unwrap();
    assert_eq!(data.num_rows(), 1);
}

#[test]
fn ignore_rules_drop_directories_and_files() {
    let fixture = Fixture::new();
    fixture
        .write("obs/v1/station_a.csv", "t\n1\n")
        .write("obs/v1/raw_exports/station_b.csv", "t\n2\n")
        .write("obs/v1/station_a_backup.csv", "t\n3\n");
    let yaml = r"
datasets:
  obs:
    path: obs
    extension: csv
    ignore_dirs: raw_exports
    ignore_files: [_backup]
";
    let catalog = fixture.catalog(yaml);
    let data = catalog.load_dataset("obs", None, None, &LoadOptions::new()).unwrap();
    assert_eq!(data.num_rows(), 1);
}

#[test]
fn empty_version_directory_has_no_files() {
    let fixture = Fixture::new();
    fixture.dir("empty/v1");
    let catalog = fixture.catalog("datasets:\n  empty:\n    path: empty\n    extension: csv\n");

    let err = catalog.load_dataset("empty", None, None, &LoadOptions::new()).unwrap_err();
    assert!(matches!(err, DataPoolError::Query(QueryError::NoFilesFound { .. })));
}

#[test]
fn unsupported_extension_lists_readers() {
    let fixture = Fixture::new();
    fixture.write("grid/v1/bed.nc", "");
    let catalog = fixture.catalog("datasets:\n  grid:\n    path: grid\n    extension: .NC\n");

    let err = catalog.load_dataset("grid", None, None, &LoadOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(matches!(
        err,
        DataPoolError::Format(FormatError::UnsupportedExtension { ref extension, .. }) if extension == "nc"
    ));
}

#[test]
fn reader_errors_name_the_file_and_dataset() {
    let fixture = Fixture::new();
    fixture.write("broken/v1/empty.csv", "");
    let catalog = fixture.catalog("datasets:\n  broken:\n    path: broken\n    extension: csv\n");

    let err = catalog.load_dataset("broken", None, None, &LoadOptions::new()).unwrap_err();
    assert!(matches!(err, DataPoolError::Format(FormatError::Read(_))));
    assert_eq!(err.kind(), ErrorKind::Io);
    let message = err.to_string();
    assert!(message.contains("empty.csv; dataset 'broken'"));
    assert!(message.contains("Cannot infer schema from empty file"));
}

#[test]
fn geojson_files_load_as_features() {
    let fixture = Fixture::new();
    fixture.write(
        "outlines/v1/basins.geojson",
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":"a","properties":{"area":12.5},"geometry":{"type":"Point","coordinates":[1.0,2.0]}},
            {"type":"Feature","properties":{"area":-9999},"geometry":null}
        ]}"#,
    );
    let yaml = "datasets:\n  outlines:\n    path: outlines\n    extension: geojson\n    no_data_value: -9999\n";
    let catalog = fixture.catalog(yaml);

    let data = catalog.load_dataset("outlines", None, None, &LoadOptions::new()).unwrap();
    let features = data.as_features().unwrap();
    assert_eq!(features.num_rows(), 2);
    assert_eq!(features.geometry_count(), 1);
    assert_eq!(features.properties.column(0).null_count(), 1);
}

fn write_tiff(fixture: &Fixture, relative: &str, data: &[f32]) {
    let path = fixture.path().join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::Gray32Float>(2, 2, data)
        .unwrap();
}

#[test]
fn tiff_files_load_as_masked_grid_variables() {
    let fixture = Fixture::new();
    write_tiff(&fixture, "bedmachine/v1/bed.tif", &[1.0, -9999.0, 3.0, 4.0]);
    write_tiff(&fixture, "bedmachine/v1/surface.tif", &[5.0, 6.0, 7.0, 8.0]);
    let yaml = "datasets:\n  bedmachine:\n    path: bedmachine\n    extension: tif\n    no_data_value: -9999\n";
    let catalog = fixture.catalog(yaml);

    let data = catalog.load_dataset("bedmachine", None, None, &LoadOptions::new()).unwrap();
    let grid = data.as_grid().unwrap();
    assert_eq!(grid.variables.keys().collect::<Vec<_>>(), vec!["bed", "surface"]);

    let bed = grid.variable("bed").unwrap();
    assert_eq!(bed.dims, vec!["y", "x"]);
    assert_eq!(bed.shape, vec![2, 2]);
    assert_eq!(bed.missing_count(), 1);
    assert!(bed.values[1].is_nan());
    assert_eq!(grid.variable("surface").unwrap().missing_count(), 0);
    assert_eq!(data.num_rows(), 2);
}

const MEASURES: &str = r"
datasets:
  measures:
    path: measures
    extension: csv
    loader: time_indexed
    static_patterns: [static]
";

fn measures_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture
        .write("measures/v1/vel_2019.csv", "x,speed\n1,10\n")
        .write("measures/v1/vel_1990_2020.csv", "x,speed\n2,20\n3,30\n")
        .write("measures/v1/vel_static.csv", "x,speed\n4,40\n");
    fixture
}

#[test]
fn annual_files_get_a_time_column() {
    let fixture = measures_fixture();
    let catalog = fixture.catalog(MEASURES);

    let data = catalog
        .load_dataset("measures", None, None, &LoadOptions::new().with_static(false))
        .unwrap();
    let table = data.as_table().unwrap();
    assert_eq!(table.num_rows(), 3);

    let time = table.column_by_name(TIME_COLUMN).unwrap();
    assert_eq!(time.data_type(), &DataType::Date32);
    let time = time.as_any().downcast_ref::<Date32Array>().unwrap();

    let mid_range = date32_days(mid_year_date(1990, 2020).unwrap());
    let single = date32_days(mid_year_date(2019, 2019).unwrap());
    assert_eq!(time.values().to_vec(), vec![mid_range, mid_range, single]);
}

#[test]
fn static_files_skip_the_time_column() {
    let fixture = measures_fixture();
    let catalog = fixture.catalog(MEASURES);

    let data = catalog
        .load_dataset("measures", None, None, &LoadOptions::new().with_static(true))
        .unwrap();
    let table = data.as_table().unwrap();
    assert_eq!(table.num_rows(), 1);
    assert!(table.column_by_name(TIME_COLUMN).is_none());
}

#[test]
fn annual_file_without_year_fails() {
    let fixture = measures_fixture();
    fixture.write("measures/v1/vel_latest.csv", "x,speed\n5,50\n");
    let catalog = fixture.catalog(MEASURES);

    let err = catalog
        .load_dataset("measures", None, None, &LoadOptions::new().with_static(false))
        .unwrap_err();
    assert!(matches!(err, DataPoolError::Format(FormatError::NoYearInFileName { .. })));
}

#[test]
fn unknown_loader_is_reported_at_load_time() {
    let fixture = foo_fixture();
    let yaml = format!("{FOO}    loader: netcdf\n");
    let catalog = fixture.catalog(&yaml);

    let err = catalog.load_dataset("foo", None, None, &LoadOptions::new()).unwrap_err();
    assert!(matches!(err, DataPoolError::Config(ConfigError::UnknownLoader { .. })));
    assert_eq!(
        err.to_string(),
        "Loader 'netcdf' is not registered. Registered loaders: default, time_indexed"
    );
}

#[test]
fn custom_loaders_receive_row_and_options() {
    let fixture = foo_fixture();
    let yaml = format!("{FOO}    loader: file_count\n");

    let count_files = |_: &DataCatalog, row: &CatalogRow, options: &LoadOptions| -> Result<LoadedData> {
        let files = discover_files(row, options)?;
        let scale: f64 = options.extra("scale").unwrap_or("1").parse().unwrap_or(1.0);
        let values = vec![scale; files.len()];
        let array = GridArray::try_new(vec!["file".to_string()], vec![files.len()], values)
            .map_err(anyhow::Error::msg)?;
        Ok(LoadedData::Grid(GridDataset::new().with_variable("count", array)))
    };
    let catalog = fixture
        .catalog(&yaml)
        .with_loaders(LoaderRegistry::new().with_loader("file_count", count_files));

    let data = catalog
        .load_dataset("foo", None, None, &LoadOptions::new().with_extra("scale", "2"))
        .unwrap();
    let grid = data.as_grid().unwrap();
    let count = grid.variable("count").unwrap();
    assert_eq!(count.shape, vec![2]);
    assert_eq!(count.values, vec![2.0, 2.0]);

    // Searching keeps the registry.
    assert!(catalog.search(&["foo"]).loaders().contains("file_count"));
}
