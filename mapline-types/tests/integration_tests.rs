use mapline_types::{
    Envelope, GeometryError, Graphic, LineStyle, LineSymbol, Polyline, PolylineBuilder, Rgb,
    SpatialReference,
};

#[test]
fn test_builder_and_from_xy_agree() {
    let built = PolylineBuilder::start_path(118.169, 34.016)
        .line_to(104.941, 39.7072)
        .line_to(96.724, 32.732)
        .build()
        .unwrap();
    let direct =
        Polyline::from_xy(&[(118.169, 34.016), (104.941, 39.7072), (96.724, 32.732)]).unwrap();

    assert_eq!(built, direct);

    let env = built.envelope();
    assert_eq!((env.xmin, env.xmax), (96.724, 118.169));
    assert_eq!((env.ymin, env.ymax), (32.732, 39.7072));

    // Линия целиком внутри начального охвата окна
    let extent = Envelope::new(-15.8, -37.8, 156.8, 77.3).unwrap();
    assert!(built.points().iter().all(|&c| extent.contains(c)));
}

#[test]
fn test_graphic_from_json_parts() {
    let geometry: Polyline =
        serde_json::from_str(r#"[{"x":150.169,"y":34.016},{"x":90.941,"y":39.7072}]"#).unwrap();
    let symbol: LineSymbol = serde_json::from_str(
        r#"{"color":{"r":0,"g":0,"b":0},"width":4.0,"style":"dash_dot"}"#,
    )
    .unwrap();

    let graphic = Graphic::new(geometry, symbol);
    assert!(graphic.is_drawable());
    assert_eq!(graphic.symbol.color, Rgb::BLACK);
    assert_eq!(graphic.symbol.style, LineStyle::DashDot);

    // Пустой путь отклоняется и при десериализации
    assert!(serde_json::from_str::<Polyline>("[]").is_err());
}

#[test]
fn test_construction_errors() {
    assert_eq!(
        PolylineBuilder::default().build(),
        Err(GeometryError::EmptyPath)
    );
    assert!(matches!(
        Polyline::from_xy(&[(0.0, 0.0), (f64::INFINITY, 1.0)]),
        Err(GeometryError::NonFinite { index: 1, .. })
    ));
    assert!(matches!(
        LineSymbol::new(Rgb::MAGENTA, -1.0),
        Err(GeometryError::InvalidWidth(_))
    ));
    assert!(matches!(
        Envelope::new(0.0, 0.0, 0.0, 1.0),
        Err(GeometryError::InvalidEnvelope(_))
    ));
    assert!("wavy".parse::<LineStyle>().is_err());
}

#[test]
fn test_spatial_reference_json() {
    let sr: SpatialReference =
        serde_json::from_str(r#"{"wkid": 102100, "latestWkid": 3857}"#).unwrap();
    assert!(sr.is_web_mercator());
    assert!(!sr.is_geographic());
    assert_eq!(sr.to_string(), "WKID 102100 (3857)");
}

#[test]
fn test_line_symbol_json_checks_width() {
    let symbol: LineSymbol =
        serde_json::from_str(r#"{"color":{"r":255,"g":0,"b":255},"width":4.0}"#).unwrap();
    assert_eq!(symbol, LineSymbol::new(Rgb::MAGENTA, 4.0).unwrap());

    for width in ["-3.0", "0.0", "0"] {
        let json = format!(r#"{{"color":{{"r":0,"g":0,"b":0}},"width":{width},"style":"solid"}}"#);
        assert!(
            serde_json::from_str::<LineSymbol>(&json).is_err(),
            "width {width} must be rejected"
        );
    }
}
