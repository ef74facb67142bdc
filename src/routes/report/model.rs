use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;

/// sp_report_1 表的一行：某地区某天的用户量
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub rp1_user_count: i32,
    pub rp1_area: String,
    pub rp1_date: String,
}

impl ReportRow {
    pub async fn load_all(pool: &PgPool) -> Result<Vec<ReportRow>, sqlx::Error> {
        sqlx::query_as::<_, ReportRow>(
            "SELECT rp1_user_count, rp1_area, rp1_date FROM sp_report_1 ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }
}

/// 序列化为空对象 {}
#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct LegendData {
    pub data: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AxisType {
    #[serde(rename = "type")]
    pub axis_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AxisData {
    pub data: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AreaStyle {
    pub normal: Empty,
}

#[derive(Debug, Serialize)]
pub struct SeriesItem {
    pub name: String,
    #[serde(rename = "type")]
    pub series_type: &'static str,
    pub stack: &'static str,
    #[serde(rename = "areaStyle")]
    pub area_style: AreaStyle,
    pub data: Vec<i32>,
}

/// 折线图配置，字段布局按 echarts 的 option 组织。
/// 没有任何数据行时 series 输出 null
#[derive(Debug, Serialize)]
pub struct ReportData {
    pub legend: LegendData,
    #[serde(rename = "yAxis")]
    pub y_axis: Vec<AxisType>,
    #[serde(rename = "xAxis")]
    pub x_axis: Vec<AxisData>,
    pub series: Option<Vec<SeriesItem>>,
}

/// 保序去重
fn dedup_keep_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        if seen.insert(item) {
            result.push(item.to_string());
        }
    }
    result
}

/// 把逐行的地区、日期数据透视成折线图配置：
/// legend 按首次出现的顺序列出地区，每个地区聚成一条堆叠曲线
pub fn build_report(rows: &[ReportRow]) -> ReportData {
    let areas = dedup_keep_order(rows.iter().map(|r| r.rp1_area.as_str()));
    let dates = dedup_keep_order(rows.iter().map(|r| r.rp1_date.as_str()));

    let series: Vec<SeriesItem> = areas
        .iter()
        .map(|area| SeriesItem {
            name: area.clone(),
            series_type: "line",
            stack: "总量",
            area_style: AreaStyle { normal: Empty {} },
            data: rows
                .iter()
                .filter(|r| &r.rp1_area == area)
                .map(|r| r.rp1_user_count)
                .collect(),
        })
        .collect();

    ReportData {
        legend: LegendData { data: areas },
        y_axis: vec![AxisType { axis_type: "value" }],
        x_axis: vec![AxisData { data: dates }],
        series: (!series.is_empty()).then_some(series),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(area: &str, date: &str, count: i32) -> ReportRow {
        ReportRow {
            rp1_user_count: count,
            rp1_area: area.to_string(),
            rp1_date: date.to_string(),
        }
    }

    #[test]
    fn legend_and_xaxis_dedup_keep_first_seen_order() {
        let rows = vec![
            row("北京", "2017-01-01", 100),
            row("上海", "2017-01-01", 90),
            row("北京", "2017-01-02", 110),
            row("上海", "2017-01-02", 95),
        ];
        let report = build_report(&rows);
        assert_eq!(report.legend.data, vec!["北京", "上海"]);
        assert_eq!(report.x_axis[0].data, vec!["2017-01-01", "2017-01-02"]);
    }

    #[test]
    fn series_groups_counts_per_area_in_row_order() {
        let rows = vec![
            row("北京", "2017-01-01", 100),
            row("上海", "2017-01-01", 90),
            row("北京", "2017-01-02", 110),
        ];
        let report = build_report(&rows);
        let series = report.series.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "北京");
        assert_eq!(series[0].data, vec![100, 110]);
        assert_eq!(series[1].name, "上海");
        assert_eq!(series[1].data, vec![90]);
    }

    #[test]
    fn report_serializes_echarts_shape() {
        let rows = vec![row("广州", "2017-02-01", 30)];
        let value = serde_json::to_value(build_report(&rows)).unwrap();
        assert_eq!(value["yAxis"], serde_json::json!([{"type": "value"}]));
        assert_eq!(value["xAxis"][0]["data"][0], "2017-02-01");
        assert_eq!(value["series"][0]["type"], "line");
        assert_eq!(value["series"][0]["stack"], "总量");
        assert_eq!(
            value["series"][0]["areaStyle"],
            serde_json::json!({"normal": {}})
        );
    }

    #[test]
    fn empty_table_keeps_axes_but_nulls_series() {
        let report = build_report(&[]);
        assert!(report.legend.data.is_empty());
        assert!(report.series.is_none());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["series"], serde_json::Value::Null);
        assert_eq!(value["yAxis"], serde_json::json!([{"type": "value"}]));
        assert_eq!(value["xAxis"], serde_json::json!([{"data": []}]));
    }
}
