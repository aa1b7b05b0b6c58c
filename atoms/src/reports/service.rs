use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{sort_newest_first, Point, Report};

const REPORT_PK: &str = "REPORT";
const REPORT_SK_PREFIX: &str = "REPORT#";

/// Load every report, newest first (pure domain logic, no UI)
pub async fn load_reports(client: &DynamoClient, table_name: &str) -> Result<Vec<Report>, String> {
    let mut reports = Vec::new();
    let mut start_key: Option<HashMap<String, AttributeValue>> = None;

    loop {
        let result = client
            .query()
            .table_name(table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(REPORT_PK.to_string()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(REPORT_SK_PREFIX.to_string()))
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| format!("DynamoDB query error: {}", e))?;

        for item in result.items() {
            if let Some(report) = report_from_item(item)? {
                reports.push(report);
            }
        }

        match result.last_evaluated_key() {
            Some(key) if !key.is_empty() => start_key = Some(key.clone()),
            _ => break,
        }
    }

    sort_newest_first(&mut reports);
    tracing::info!("Loaded {} reports from {}", reports.len(), table_name);
    Ok(reports)
}

/// Write the whole report record (create or overwrite, last writer wins)
pub async fn put_report(client: &DynamoClient, table_name: &str, report: &Report) -> Result<(), String> {
    let points_json = serde_json::to_string(&report.points)
        .map_err(|e| format!("Failed to serialize points: {}", e))?;
    let now = chrono::Utc::now().to_rfc3339();

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(REPORT_PK.to_string()))
        .item("SK", AttributeValue::S(format!("{}{}", REPORT_SK_PREFIX, report.report_id)))
        .item("owner_id", AttributeValue::S(report.owner_id.clone()))
        .item("owner_email", AttributeValue::S(report.owner_email.clone()))
        .item("title", AttributeValue::S(report.title.clone()))
        .item("area", AttributeValue::S(report.area.clone()))
        .item("created_at", AttributeValue::S(report.created_at.clone()))
        .item("points", AttributeValue::S(points_json))
        .item("updated_at", AttributeValue::S(now))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(())
}

/// Delete the report record only. Uploaded images stay in the bucket.
pub async fn delete_report(client: &DynamoClient, table_name: &str, report_id: &str) -> Result<(), String> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(REPORT_PK.to_string()))
        .key("SK", AttributeValue::S(format!("{}{}", REPORT_SK_PREFIX, report_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// Map one table item to a report. Items whose SK is not a report key are skipped.
pub fn report_from_item(item: &HashMap<String, AttributeValue>) -> Result<Option<Report>, String> {
    let Some(report_id) = item
        .get("SK")
        .and_then(|v| v.as_s().ok())
        .and_then(|sk| sk.strip_prefix(REPORT_SK_PREFIX))
    else {
        return Ok(None);
    };

    let points: Vec<Point> = match item.get("points").and_then(|v| v.as_s().ok()) {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| format!("Report {} has unreadable points: {}", report_id, e))?,
        None => Vec::new(),
    };

    Ok(Some(Report {
        report_id: report_id.to_string(),
        owner_id: string_attr(item, "owner_id"),
        owner_email: string_attr(item, "owner_email"),
        title: string_attr(item, "title"),
        area: string_attr(item, "area"),
        created_at: string_attr(item, "created_at"),
        points,
    }))
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> String {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    #[test]
    fn maps_item_with_points() {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), s("REPORT"));
        item.insert("SK".to_string(), s("REPORT#r1"));
        item.insert("owner_id".to_string(), s("u1"));
        item.insert("title".to_string(), s("Site visit"));
        item.insert("created_at".to_string(), s("2024-05-01T09:00:00+00:00"));
        item.insert(
            "points".to_string(),
            s(r#"[{"point_id":"p1","text":"Cracked wall","images":["images/u1/r1/a.jpg"]}]"#),
        );

        let report = report_from_item(&item).unwrap().unwrap();
        assert_eq!(report.report_id, "r1");
        assert_eq!(report.title, "Site visit");
        assert_eq!(report.area, "");
        assert_eq!(report.points.len(), 1);
        assert_eq!(report.points[0].images, vec!["images/u1/r1/a.jpg".to_string()]);
    }

    #[test]
    fn skips_foreign_items() {
        let mut item = HashMap::new();
        item.insert("SK".to_string(), s("USER#u1"));
        assert!(report_from_item(&item).unwrap().is_none());
    }

    #[test]
    fn rejects_corrupt_points() {
        let mut item = HashMap::new();
        item.insert("SK".to_string(), s("REPORT#r9"));
        item.insert("points".to_string(), s("{not json"));
        let err = report_from_item(&item).unwrap_err();
        assert!(err.contains("r9"));
    }
}
