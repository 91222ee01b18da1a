use flowmap_core::error::FlowError;
use flowmap_core::layers::{make_2d_layers, make_flow_layers, Dataset};
use serde_json::json;

fn flow_dataset(values: serde_json::Value) -> Dataset {
    Dataset::from_value(json!({
        "linearscales": { "coord": [1, 0, 0], "value": [1, 0], "flow": [1, 0] },
        "values": values,
    }))
    .unwrap()
}

#[test]
fn test_single_flow_cell() {
    let data = flow_dataset(json!([[0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 5, 2, 3]]));
    let layers = make_flow_layers(&data).unwrap();

    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].cells.len(), 1);
    let cell = &layers[0].cells[0];
    assert_eq!((cell.i, cell.j, cell.k), (0, 0, 0));
    assert_eq!(cell.points, [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    assert_eq!(cell.value, 5.0);

    let flow = cell.flow.expect("flow layers carry flow");
    assert_eq!(flow.i_plus, Some(2.0));
    assert_eq!(flow.j_plus, Some(3.0));
    assert_eq!(flow.i_minus, 0.0);
    assert_eq!(flow.j_minus, 0.0);
}

#[test]
fn test_negative_flow_from_neighbours() {
    let data = flow_dataset(json!([
        [0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 1, 7, 4],
        [1, 0, 0, 1, 2, 2, 1, 0, 0, 1, 1, 1, 9, 6],
        [0, 1, 0, 0, 1, 1, 0, 1, 1, 2, 2, 1, 8, 5],
    ]));
    let layers = make_flow_layers(&data).unwrap();
    let cells = &layers[0].cells;
    let find = |i, j| cells.iter().find(|c| c.i == i && c.j == j).unwrap().flow.unwrap();

    assert_eq!(find(1, 0).i_minus, 7.0);
    assert_eq!(find(1, 0).j_minus, 0.0);
    assert_eq!(find(0, 1).j_minus, 4.0);
    assert_eq!(find(0, 1).i_minus, 0.0);
    assert_eq!(find(0, 0).i_minus, 0.0);
}

#[test]
fn test_neighbour_without_flow_value_gives_zero() {
    // The first cell has no flow columns.
    let data = flow_dataset(json!([
        [0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 1],
        [1, 0, 0, 1, 2, 2, 1, 0, 0, 1, 1, 1, 9, 6],
    ]));
    let layers = make_flow_layers(&data).unwrap();
    let second = layers[0].cells.iter().find(|c| c.i == 1).unwrap();
    assert_eq!(second.flow.unwrap().i_minus, 0.0);
    let first = layers[0].cells.iter().find(|c| c.i == 0).unwrap();
    assert_eq!(first.flow.unwrap().i_plus, None);
}

#[test]
fn test_layers_grouped_by_k() {
    let data = flow_dataset(json!([
        [0, 0, 2, 0, 1, 1, 0, 0, 0, 1, 1, 1, 7, 4],
        [1, 0, 0, 1, 2, 2, 1, 0, 0, 1, 1, 1, 9, 6],
        [1, 0, 2, 1, 2, 2, 1, 0, 0, 1, 1, 1, 3, 6],
    ]));
    let layers = make_flow_layers(&data).unwrap();
    let ks: Vec<u32> = layers.iter().map(|l| l.k).collect();
    assert_eq!(ks, vec![0, 2]);
    assert_eq!(layers[1].cells.len(), 2);
    // Neighbour lookup stays within the layer.
    let in_k0 = &layers[0].cells[0];
    assert_eq!(in_k0.flow.unwrap().i_minus, 0.0);
    let in_k2 = layers[1].cells.iter().find(|c| c.i == 1).unwrap();
    assert_eq!(in_k2.flow.unwrap().i_minus, 7.0);
}

#[test]
fn test_linear_scale_decoding() {
    let data = Dataset::from_value(json!({
        "linearscales": { "coord": [10, 100, 200], "value": [4, -1], "flow": [2, 0.5] },
        "values": [[0, 0, 0, 0, 10, 10, 0, 0, 0, 20, 20, 8, 3, 1]],
    }))
    .unwrap();
    let layers = make_flow_layers(&data).unwrap();
    let cell = &layers[0].cells[0];
    assert_eq!(cell.points, [[100.0, 200.0], [101.0, 200.0], [101.0, 202.0], [100.0, 202.0]]);
    assert_eq!(cell.value, 1.0);
    assert_eq!(cell.flow.unwrap().i_plus, Some(2.0));
    assert_eq!(cell.flow.unwrap().j_plus, Some(1.0));
}

#[test]
fn test_2d_layers_have_no_flow_keys() {
    let data = Dataset::from_value(json!({
        "linearscales": { "coord": [1, 0, 0], "value": [1, 0] },
        "values": [[0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 5]],
    }))
    .unwrap();
    assert!(!data.has_flow());

    let layers = make_2d_layers(&data).unwrap();
    assert_eq!(layers, data.layers().unwrap());
    let cell = &layers[0].cells[0];
    assert!(cell.flow.is_none());

    let encoded = serde_json::to_value(cell).unwrap();
    let keys: Vec<&str> = encoded.as_object().unwrap().keys().map(String::as_str).collect();
    assert!(keys.contains(&"points"));
    assert!(keys.contains(&"value"));
    for flow_key in ["FLOWI+", "FLOWJ+", "FLOWI-", "FLOWJ-"] {
        assert!(!keys.contains(&flow_key), "unexpected key {}", flow_key);
    }
}

#[test]
fn test_flow_cell_serializes_flow_keys() {
    let data = flow_dataset(json!([[0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 5, 2, 3]]));
    let layers = make_flow_layers(&data).unwrap();
    let encoded = serde_json::to_value(&layers[0].cells[0]).unwrap();
    assert_eq!(encoded["FLOWI+"], json!(2.0));
    assert_eq!(encoded["FLOWJ+"], json!(3.0));
    assert_eq!(encoded["FLOWI-"], json!(0.0));
    assert_eq!(encoded["FLOWJ-"], json!(0.0));
}

#[test]
fn test_flow_layers_require_flow_scale() {
    let data = Dataset::from_value(json!({
        "linearscales": { "coord": [1, 0, 0], "value": [1, 0] },
        "values": [],
    }))
    .unwrap();
    assert!(matches!(make_flow_layers(&data), Err(FlowError::MissingScale("flow"))));
}

#[test]
fn test_short_row_rejected() {
    let data = flow_dataset(json!([[0, 0, 0, 1, 2]]));
    assert!(matches!(
        make_flow_layers(&data),
        Err(FlowError::RowTooShort { row: 0, expected: 12, found: 5 })
    ));
}

#[test]
fn test_invalid_index_rejected() {
    let data = flow_dataset(json!([[-1, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 5]]));
    assert!(matches!(
        make_flow_layers(&data),
        Err(FlowError::InvalidIndex { row: 0, column: 0, .. })
    ));
    let data = flow_dataset(json!([[0, 0.5, 0, 0, 1, 1, 0, 0, 0, 1, 1, 5]]));
    assert!(matches!(
        make_flow_layers(&data),
        Err(FlowError::InvalidIndex { column: 1, .. })
    ));
}

#[test]
fn test_zero_scale_rejected() {
    let data = Dataset::from_value(json!({
        "linearscales": { "coord": [0, 0, 0], "value": [1, 0] },
        "values": [[0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 5]],
    }))
    .unwrap();
    assert!(matches!(make_2d_layers(&data), Err(FlowError::InvalidScale("coord"))));
}

#[test]
fn test_dataset_from_json_string() {
    let data = Dataset::from_json(
        r#"{"linearscales":{"coord":[1,0,0],"value":[1,0],"flow":[1,0]},"values":[]}"#,
    )
    .unwrap();
    assert!(data.has_flow());
    assert!(data.layers().unwrap().is_empty());
    assert!(matches!(Dataset::from_json("{"), Err(FlowError::Json(_))));
}
