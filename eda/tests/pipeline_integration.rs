//! End-to-end runs over small CSV files written to a temp dir.

use std::io::Write;

use tempfile::NamedTempFile;
use vehicle_ads::{
    analyze_csv, clean_listings, filter_outliers, load_clean, parse_file, AnalysisOptions, BandSettings, Column,
    CsvError, DeriveError, FilterMode, ImputeError, PipelineError, UNKNOWN_PAINT_COLOR,
};

const HEADER: &str = "price,model_year,model,condition,cylinders,fuel,odometer,transmission,type,paint_color,is_4wd,date_posted,days_listed";

const ROWS: &[&str] = &[
    "9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23,19",
    "25500,,ford f150,good,6.0,gas,88705.0,automatic,truck,white,1.0,2018-10-19,50",
    "5500,2013.0,hyundai sonata,like new,4.0,gas,110000.0,automatic,sedan,red,,2019-02-07,79",
    "1500,2003.0,ford f150,fair,8.0,gas,,automatic,truck,,,2019-03-22,9",
    "14900,2017.0,chrysler 200,excellent,4.0,gas,80903.0,automatic,sedan,black,,2019-04-02,28",
    "14990,2014.0,chrysler 300,excellent,6.0,gas,57954.0,automatic,sedan,black,1.0,2018-06-20,15",
    "12990,2015.0,toyota camry,excellent,4.0,gas,79212.0,automatic,sedan,white,,2018-12-27,73",
    "15990,2013.0,honda pilot,excellent,6.0,gas,109473.0,automatic,SUV,black,1.0,2019-01-07,68",
    "11500,2012.0,kia sorento,excellent,4.0,gas,104174.0,automatic,SUV,,1.0,2018-07-16,19",
    "9200,2008.0,honda pilot,excellent,,gas,147191.0,automatic,SUV,blue,1.0,2019-02-15,17",
    "19500,2011.0,chevrolet silverado 1500,excellent,8.0,gas,128413.0,automatic,pickup,black,1.0,2018-09-17,38",
    "8990,2012.0,honda accord,excellent,4.0,gas,111142.0,automatic,sedan,grey,,2019-03-28,29",
    "18990,2012.0,ram 1500,excellent,8.0,gas,140742.0,automatic,pickup,,1.0,2019-04-02,37",
    "16500,2018.0,hyundai sonata,excellent,4.0,gas,22104.0,automatic,sedan,silver,,2019-01-14,29",
    "12990,2009.0,gmc yukon,excellent,8.0,gas,132285.0,automatic,SUV,black,1.0,2019-01-31,24",
    "8990,2015.0,ford f150,good,6.0,gas,,automatic,truck,silver,1.0,2019-05-03,250",
    "3000,2019.0,ford f150,new,6.0,gas,3000.0,automatic,truck,white,1.0,2019-04-01,0",
];

fn write_csv(header: &str, rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", header).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

fn quiet() {
    vehicle_ads::logs::LOG_BROADCASTER.set_quiet(true);
}

#[test]
fn test_clean_fills_every_imputed_field() {
    quiet();
    let file = write_csv(HEADER, ROWS);
    let (parsed, listings) = load_clean(file.path(), None).unwrap();

    assert_eq!(parsed.delimiter, ',');
    assert_eq!(listings.len(), ROWS.len());

    // ford f150 years: 2003, 2015, 2019 all once -> smallest mode
    assert_eq!(listings[1].model_year, 2003);
    // honda pilot cylinders from the other pilot
    assert_eq!(listings[9].cylinders, 6);
    assert_eq!(listings[0].paint_color, UNKNOWN_PAINT_COLOR);

    for l in &listings {
        assert!(l.age_of_the_vehicle >= 1);
        assert!(l.condition_id <= 5);
        assert_eq!(l.condition_id, l.condition.rank());
        assert_eq!(l.avg_mileage, l.odometer / l.age_of_the_vehicle as f64);
        assert!(!l.paint_color.is_empty());
    }
}

#[test]
fn test_odometer_mean_uses_imputed_year() {
    quiet();
    let file = write_csv(HEADER, ROWS);
    let (_, listings) = load_clean(file.path(), None).unwrap();

    // the 2003 f150 shares its year group with the f150 whose year was imputed
    assert_eq!(listings[3].odometer, 88705.0);

    // only the camry has an odometer among 2015 cars
    let f150_2015 = &listings[15];
    assert_eq!(f150_2015.model_year, 2015);
    assert_eq!(f150_2015.odometer, 79212.0);
}

#[test]
fn test_example_f150_year_imputation() {
    quiet();
    let rows = [
        "20000,2015.0,ford f150,good,8.0,gas,60000.0,automatic,truck,white,1.0,2019-05-03,10",
        "21000,,ford f150,good,8.0,gas,70000.0,automatic,truck,white,1.0,2019-05-03,10",
        "22000,2015.0,ford f150,good,8.0,gas,80000.0,automatic,truck,white,1.0,2019-05-03,10",
    ];
    let file = write_csv(HEADER, &rows);
    let parsed = parse_file(file.path(), None).unwrap();
    let listings = clean_listings(&parsed.listings).unwrap();

    assert_eq!(listings[1].model_year, 2015);
    assert_eq!(listings[1].year, 2019);
    assert_eq!(listings[1].day_of_year, 123);
    assert_eq!(listings[1].age_of_the_vehicle, 4);
}

#[test]
fn test_empty_year_group_is_fatal() {
    quiet();
    // the 2003 f150 row has no odometer and nothing else from 2003 does either
    let rows = [ROWS[0], ROWS[3]];
    let file = write_csv(HEADER, &rows);
    let err = load_clean(file.path(), None).unwrap_err();

    match err {
        PipelineError::Impute(ImputeError::EmptyGroup { group_key, group, target }) => {
            assert_eq!(group_key, "model_year");
            assert_eq!(group, "2003");
            assert_eq!(target, "odometer");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_column_is_fatal() {
    quiet();
    let header = HEADER.replace(",days_listed", "");
    let file = write_csv(&header, &["9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23"]);
    let err = load_clean(file.path(), None).unwrap_err();
    assert!(matches!(err, PipelineError::Csv(CsvError::MissingColumn(ref c)) if c == "days_listed"));
}

#[test]
fn test_unknown_condition_is_fatal() {
    quiet();
    let file = write_csv(
        HEADER,
        &["9400,2011.0,bmw x5,showroom,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23,19"],
    );
    let err = load_clean(file.path(), None).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Derive(DeriveError::UnknownCondition { line: 2, ref value }) if value == "showroom"
    ));
}

#[test]
fn test_bad_date_is_fatal() {
    quiet();
    let file = write_csv(
        HEADER,
        &["9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,23/06/2018,19"],
    );
    let err = load_clean(file.path(), None).unwrap_err();
    assert!(matches!(err, PipelineError::Derive(DeriveError::InvalidDate { line: 2, .. })));
}

#[test]
fn test_days_listed_outlier_dropped() {
    quiet();
    let file = write_csv(HEADER, ROWS);
    let (_, listings) = load_clean(file.path(), None).unwrap();
    let (kept, band) = filter_outliers(&listings, Column::DaysListed, BandSettings::default()).unwrap();

    assert!(band.contains(0.0));
    assert!(!kept.iter().any(|l| l.days_listed == 250));
    assert_eq!(kept.len(), listings.len() - 1);
}

#[test]
fn test_analyze_report() {
    quiet();
    let file = write_csv(HEADER, ROWS);
    let options = AnalysisOptions {
        min_category_ads: 2,
        ..Default::default()
    };
    let report = analyze_csv(file.path(), &options).unwrap();

    assert_eq!(report.csv_info.row_count, ROWS.len());
    assert_eq!(report.cleaned_rows, ROWS.len());
    assert_eq!(report.columns.len(), Column::DEFAULT_CLEANING.len());
    assert_eq!(report.filter.bands.len(), Column::DEFAULT_CLEANING.len());
    assert!(report.filter.rows_kept <= ROWS.len());
    assert_eq!(report.price_factors.len(), 2);

    let missing = |c: &str| report.missing_before.iter().find(|m| m.column == c).unwrap().missing;
    assert_eq!(missing("model_year"), 1);
    assert_eq!(missing("odometer"), 2);
    assert_eq!(missing("cylinders"), 1);
    assert_eq!(missing("paint_color"), 4);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["filter"]["mode"], "independent");
    assert!(json["columns"][0]["before"]["q1"].is_number());
}

#[test]
fn test_sequential_mode_chains_bands() {
    quiet();
    let file = write_csv(HEADER, ROWS);
    let options = AnalysisOptions {
        filter_mode: FilterMode::Sequential,
        ..Default::default()
    };
    let report = analyze_csv(file.path(), &options).unwrap();
    let bands = &report.filter.bands;

    assert_eq!(bands[0].rows_in, ROWS.len());
    for pair in bands.windows(2) {
        assert_eq!(pair[1].rows_in, pair[0].rows_in - pair[0].removed);
    }
    let last = bands.last().unwrap();
    assert_eq!(report.filter.rows_kept, last.rows_in - last.removed);
}

#[test]
fn test_semicolon_file_with_explicit_delimiter() {
    quiet();
    let rows: Vec<String> = ROWS[..3].iter().map(|r| r.replace(',', ";")).collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = write_csv(&HEADER.replace(',', ";"), &rows);

    let parsed = parse_file(file.path(), Some(';')).unwrap();
    assert_eq!(parsed.listings.len(), 3);
    assert_eq!(parsed.listings[2].condition, "like new");
}
