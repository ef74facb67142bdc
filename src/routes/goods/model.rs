use std::path::{Path, PathBuf};

use chrono::Utc;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// sp_goods 表实体。接口只暴露部分字段，其余 serde 跳过；
/// 修改商品时请求体也按这套字段解析，跳过的字段一律取零值
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Goods {
    pub goods_id: i32,
    #[serde(skip)]
    pub cat_id: i32,
    pub goods_name: String,
    pub goods_price: f64,
    pub goods_number: i32,
    pub goods_weight: i32,
    #[serde(skip)]
    pub goods_introduce: String,
    #[serde(skip)]
    pub goods_big_logo: String,
    #[serde(skip)]
    pub goods_small_logo: String,
    #[serde(skip)]
    pub is_del: String,
    pub goods_state: i32,
    pub add_time: i64,
    pub upd_time: i64,
    #[serde(skip)]
    pub delete_time: Option<i64>,
    #[serde(skip)]
    pub cat_one_id: i32,
    #[serde(skip)]
    pub cat_two_id: i32,
    #[serde(skip)]
    pub cat_three_id: i32,
    pub hot_number: i32,
    pub is_promote: bool,
}

const GOODS_COLUMNS: &str = r#"
    goods_id, cat_id, goods_name, goods_price, goods_number, goods_weight,
    goods_introduce, goods_big_logo, goods_small_logo, is_del, goods_state,
    add_time, upd_time, delete_time, cat_one_id, cat_two_id, cat_three_id,
    hot_number, is_promote
"#;

impl Goods {
    /// 统计未删除的商品数，query 非空时按名称模糊匹配。
    /// 判断是否带了查询词只剔除空格，查询本身用原串
    pub async fn count_filtered(pool: &PgPool, query: &str) -> Result<i64, sqlx::Error> {
        if query.trim_matches(' ').is_empty() {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sp_goods WHERE is_del = '0'")
                .fetch_one(pool)
                .await
        } else {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sp_goods WHERE is_del = '0' AND goods_name ILIKE $1",
            )
            .bind(format!("%{}%", query))
            .fetch_one(pool)
            .await
        }
    }

    /// 分页取商品，新上架的排前面
    pub async fn list_page(
        pool: &PgPool,
        query: &str,
        pagenum: i64,
        pagesize: i64,
    ) -> Result<Vec<Goods>, sqlx::Error> {
        let offset = (pagenum - 1) * pagesize;
        if query.trim_matches(' ').is_empty() {
            sqlx::query_as::<_, Goods>(&format!(
                r#"
                SELECT {GOODS_COLUMNS}
                FROM sp_goods
                WHERE is_del = '0'
                ORDER BY add_time DESC
                LIMIT $1 OFFSET $2
                "#
            ))
            .bind(pagesize)
            .bind(offset)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, Goods>(&format!(
                r#"
                SELECT {GOODS_COLUMNS}
                FROM sp_goods
                WHERE is_del = '0' AND goods_name ILIKE $1
                ORDER BY add_time DESC
                LIMIT $2 OFFSET $3
                "#
            ))
            .bind(format!("%{}%", query))
            .bind(pagesize)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }

    pub async fn exists_by_id(pool: &PgPool, goods_id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sp_goods WHERE goods_id = $1)",
        )
        .bind(goods_id)
        .fetch_one(pool)
        .await
    }

    /// 更新商品的可编辑字段并刷新修改时间，返回更新后的整行
    pub async fn update_info(
        pool: &PgPool,
        goods_id: i32,
        body: &Goods,
        now: i64,
    ) -> Result<Goods, sqlx::Error> {
        sqlx::query_as::<_, Goods>(&format!(
            r#"
            UPDATE sp_goods
            SET goods_name = $1, goods_price = $2, goods_number = $3,
                goods_weight = $4, upd_time = $5
            WHERE goods_id = $6
            RETURNING {GOODS_COLUMNS}
            "#
        ))
        .bind(&body.goods_name)
        .bind(body.goods_price)
        .bind(body.goods_number)
        .bind(body.goods_weight)
        .bind(now)
        .bind(goods_id)
        .fetch_one(pool)
        .await
    }

    /// 假删，商品从列表里消失但记录保留
    pub async fn mark_deleted(pool: &PgPool, goods_id: i32, now: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sp_goods SET is_del = '1', delete_time = $1 WHERE goods_id = $2")
            .bind(now)
            .bind(goods_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// 商品列表响应体
#[derive(Debug, Serialize)]
pub struct GoodsListData {
    pub total: i64,
    pub pagenum: i64,
    pub goods: Vec<Goods>,
}

/// 修改商品后回显的数据
#[derive(Debug, Serialize)]
pub struct GoodsInfoData {
    pub goods_name: String,
    pub goods_price: f64,
    pub goods_weight: i32,
}

/// sp_goods_pics 表实体，序列化沿用历史接口的大写驼峰键名
#[derive(Debug, Clone, Serialize)]
pub struct GoodsPic {
    #[serde(rename = "PicsId")]
    pub pics_id: i32,
    #[serde(rename = "GoodsId")]
    pub goods_id: i32,
    #[serde(rename = "PicsBig")]
    pub pics_big: String,
    #[serde(rename = "PicsMid")]
    pub pics_mid: String,
    #[serde(rename = "PicsSma")]
    pub pics_sma: String,
}

/// 添加商品时随商品落库的属性，attr_name 等字段原样回显请求里的值
#[derive(Debug, Serialize)]
pub struct GoodsAttrData {
    pub goods_id: i32,
    pub attr_id: i32,
    pub attr_value: String,
    pub add_price: f64,
    pub attr_name: String,
    pub attr_sel: String,
    pub attr_write: String,
    pub attr_vals: String,
}

/// 添加商品成功后回显的数据，没有图片或属性时对应字段输出 null
#[derive(Debug, Serialize)]
pub struct GoodsDetail {
    pub goods_id: i32,
    pub goods_name: String,
    pub goods_price: f64,
    pub goods_number: i32,
    pub goods_weight: i32,
    pub goods_state: i32,
    pub add_time: i64,
    pub upd_time: i64,
    pub hot_number: i32,
    pub is_promote: bool,
    pub pics: Option<Vec<GoodsPic>>,
    pub attrs: Option<Vec<GoodsAttrData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PicBody {
    pub pic: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AttrBody {
    pub attr_id: i32,
    pub attr_value: String,
    pub attr_name: String,
    pub attr_sel: String,
    pub attr_write: String,
    pub attr_vals: String,
}

/// 添加商品的请求体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddGoodBody {
    pub goods_name: String,
    pub goods_cate: String,
    pub goods_price: f64,
    pub goods_number: i32,
    pub goods_weight: i32,
    pub goods_introduce: String,
    pub pics: Vec<PicBody>,
    pub attrs: Vec<AttrBody>,
}

/// 添加商品过程中的失败原因，对外统一提示添加失败
#[derive(Debug)]
pub enum AddGoodError {
    BadCate,
    Db(sqlx::Error),
    Image(image::ImageError),
}

impl From<sqlx::Error> for AddGoodError {
    fn from(e: sqlx::Error) -> Self {
        AddGoodError::Db(e)
    }
}

impl From<image::ImageError> for AddGoodError {
    fn from(e: image::ImageError) -> Self {
        AddGoodError::Image(e)
    }
}

/// goods_cate 是"一级,二级,三级"的分类 id 链
pub fn parse_cate_chain(goods_cate: &str) -> Option<[i32; 3]> {
    let parts: Vec<&str> = goods_cate.split(',').collect();
    if parts.len() != 3 {
        return None;
    }
    let mut ids = [0i32; 3];
    for (i, part) in parts.iter().enumerate() {
        ids[i] = part.parse().ok()?;
    }
    Some(ids)
}

/// URL 路径都挂在 /static 下，换算成磁盘路径
pub fn disk_path(static_dir: &str, url_path: &str) -> PathBuf {
    let rel = url_path.strip_prefix("/static/").unwrap_or(url_path);
    Path::new(static_dir).join(rel)
}

/// 缩略图路径：在扩展名前插入尺寸后缀
pub fn variant_path(ori_path: &str, size: u32) -> String {
    ori_path.replace('.', &format!("_{size}×{size}."))
}

/// 上传限制：不超过 500KB，扩展名必须是 .jpg/.png/.jpeg（区分大小写）
pub fn check_picture(file_name: &str, size: usize) -> Result<&str, &'static str> {
    if size > 500 * 1024 {
        return Err("文件太大，请重新上传");
    }
    let ext = file_name
        .rfind('.')
        .map(|i| &file_name[i..])
        .unwrap_or("");
    if ext != ".jpg" && ext != ".png" && ext != ".jpeg" {
        return Err("文件格式错误，请重新上传");
    }
    Ok(ext)
}

/// 按原图生成 800、400、200 三档缩略图并写盘，返回三个缩略图的 URL 路径
pub fn resize_variants(
    static_dir: &str,
    ori_path: &str,
) -> Result<Vec<String>, image::ImageError> {
    let img = image::open(disk_path(static_dir, ori_path))?;
    let mut paths = Vec::with_capacity(3);
    for size in [800u32, 400, 200] {
        let resized = img.resize_exact(size, size, FilterType::Lanczos3);
        let path = variant_path(ori_path, size);
        resized.save(disk_path(static_dir, &path))?;
        paths.push(path);
    }
    Ok(paths)
}

/// 添加商品。主记录、图片、属性在一个事务里落库，任何一步失败整体回滚；
/// 已经写盘的缩略图不回收
pub async fn add_good(
    pool: &PgPool,
    static_dir: &str,
    public_base_url: &str,
    body: AddGoodBody,
) -> Result<GoodsDetail, AddGoodError> {
    let mut tx = pool.begin().await?;

    let cate_ids = parse_cate_chain(&body.goods_cate).ok_or(AddGoodError::BadCate)?;
    let now = Utc::now().timestamp();

    let goods = sqlx::query_as::<_, Goods>(&format!(
        r#"
        INSERT INTO sp_goods
            (goods_name, goods_price, goods_number, goods_weight, cat_id,
             goods_introduce, is_del, add_time, upd_time,
             cat_one_id, cat_two_id, cat_three_id)
        VALUES ($1, $2, $3, $4, $5, $6, '0', $7, $7, $8, $9, $10)
        RETURNING {GOODS_COLUMNS}
        "#
    ))
    .bind(&body.goods_name)
    .bind(body.goods_price)
    .bind(body.goods_number)
    .bind(body.goods_weight)
    .bind(cate_ids[2])
    .bind(&body.goods_introduce)
    .bind(now)
    .bind(cate_ids[0])
    .bind(cate_ids[1])
    .bind(cate_ids[2])
    .fetch_one(&mut *tx)
    .await?;

    let mut pics = Vec::new();
    for pic in &body.pics {
        let variants = resize_variants(static_dir, &pic.pic)?;
        let pics_big = format!("{}{}", public_base_url, variants[0]);
        let pics_mid = format!("{}{}", public_base_url, variants[1]);
        let pics_sma = format!("{}{}", public_base_url, variants[2]);
        let pics_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO sp_goods_pics (goods_id, pics_big, pics_mid, pics_sma)
            VALUES ($1, $2, $3, $4)
            RETURNING pics_id
            "#,
        )
        .bind(goods.goods_id)
        .bind(&pics_big)
        .bind(&pics_mid)
        .bind(&pics_sma)
        .fetch_one(&mut *tx)
        .await?;
        pics.push(GoodsPic {
            pics_id,
            goods_id: goods.goods_id,
            pics_big,
            pics_mid,
            pics_sma,
        });
    }

    let mut attrs = Vec::new();
    for attr in &body.attrs {
        sqlx::query(
            r#"
            INSERT INTO sp_goods_attr (goods_id, attr_id, attr_value, add_price)
            VALUES ($1, $2, $3, 0)
            "#,
        )
        .bind(goods.goods_id)
        .bind(attr.attr_id)
        .bind(&attr.attr_value)
        .execute(&mut *tx)
        .await?;
        attrs.push(GoodsAttrData {
            goods_id: goods.goods_id,
            attr_id: attr.attr_id,
            attr_value: attr.attr_value.clone(),
            add_price: 0.0,
            attr_name: attr.attr_name.clone(),
            attr_sel: attr.attr_sel.clone(),
            attr_write: attr.attr_write.clone(),
            attr_vals: attr.attr_vals.clone(),
        });
    }

    tx.commit().await?;

    Ok(GoodsDetail {
        goods_id: goods.goods_id,
        goods_name: goods.goods_name,
        goods_price: goods.goods_price,
        goods_number: goods.goods_number,
        goods_weight: goods.goods_weight,
        goods_state: goods.goods_state,
        add_time: goods.add_time,
        upd_time: goods.upd_time,
        hot_number: goods.hot_number,
        is_promote: goods.is_promote,
        pics: (!pics.is_empty()).then_some(pics),
        attrs: (!attrs.is_empty()).then_some(attrs),
    })
}

/// 上传成功后回显的临时路径和完整地址
#[derive(Debug, Serialize)]
pub struct UploadData {
    pub tmp_path: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cate_chain_needs_three_int_parts() {
        assert_eq!(parse_cate_chain("1,3,6"), Some([1, 3, 6]));
        assert_eq!(parse_cate_chain("1,3"), None);
        assert_eq!(parse_cate_chain("1,3,6,8"), None);
        assert_eq!(parse_cate_chain("1,3,x"), None);
        assert_eq!(parse_cate_chain(""), None);
    }

    #[test]
    fn variant_path_inserts_size_before_ext() {
        assert_eq!(
            variant_path("/static/img/abc123.jpg", 800),
            "/static/img/abc123_800×800.jpg"
        );
        assert_eq!(
            variant_path("/static/img/abc123.png", 200),
            "/static/img/abc123_200×200.png"
        );
    }

    #[test]
    fn picture_check_limits_size_then_ext() {
        assert_eq!(check_picture("a.jpg", 1024), Ok(".jpg"));
        assert_eq!(check_picture("a.jpeg", 500 * 1024), Ok(".jpeg"));
        assert_eq!(check_picture("a.png", 1), Ok(".png"));
        assert_eq!(
            check_picture("a.jpg", 500 * 1024 + 1),
            Err("文件太大，请重新上传")
        );
        // 大小不合格时先报大小，不看格式
        assert_eq!(
            check_picture("a.gif", 600 * 1024),
            Err("文件太大，请重新上传")
        );
        assert_eq!(check_picture("a.gif", 1024), Err("文件格式错误，请重新上传"));
        assert_eq!(check_picture("a.JPG", 1024), Err("文件格式错误，请重新上传"));
        assert_eq!(check_picture("noext", 1024), Err("文件格式错误，请重新上传"));
    }

    #[test]
    fn disk_path_maps_static_prefix() {
        assert_eq!(
            disk_path("./static", "/static/img/a.jpg"),
            PathBuf::from("./static/img/a.jpg")
        );
    }

    #[test]
    fn goods_hides_internal_fields() {
        let goods = Goods {
            goods_id: 1,
            cat_id: 6,
            goods_name: "小米手机".to_string(),
            goods_price: 1999.0,
            is_del: "0".to_string(),
            goods_introduce: "内部介绍".to_string(),
            ..Goods::default()
        };
        let value = serde_json::to_value(&goods).unwrap();
        assert_eq!(value["goods_name"], "小米手机");
        assert!(value.get("cat_id").is_none());
        assert!(value.get("is_del").is_none());
        assert!(value.get("goods_introduce").is_none());
        assert!(value.get("delete_time").is_none());
    }

    #[test]
    fn update_body_ignores_internal_fields() {
        let body: Goods = serde_json::from_slice(
            r#"{"goods_name":"华为手机","goods_price":2999,"goods_number":10,"goods_weight":1,"is_del":"1"}"#.as_bytes(),
        )
        .unwrap();
        assert_eq!(body.goods_name, "华为手机");
        // is_del 打了 skip，请求里怎么传都落回零值
        assert_eq!(body.is_del, "");
    }

    #[test]
    fn pics_serialize_with_legacy_keys() {
        let pic = GoodsPic {
            pics_id: 7,
            goods_id: 1,
            pics_big: "http://127.0.0.1:8700/static/img/a_800×800.jpg".to_string(),
            pics_mid: "http://127.0.0.1:8700/static/img/a_400×400.jpg".to_string(),
            pics_sma: "http://127.0.0.1:8700/static/img/a_200×200.jpg".to_string(),
        };
        let value = serde_json::to_value(&pic).unwrap();
        assert_eq!(value["PicsId"], 7);
        assert!(value["PicsBig"].as_str().unwrap().contains("800×800"));
        assert!(value.get("pics_id").is_none());
    }

    #[test]
    fn add_good_body_defaults_missing_fields() {
        let body: AddGoodBody =
            serde_json::from_slice(r#"{"goods_name":"手机","goods_cate":"1,3,6"}"#.as_bytes()).unwrap();
        assert_eq!(body.goods_name, "手机");
        assert!(body.pics.is_empty());
        assert!(body.attrs.is_empty());
        assert_eq!(body.goods_price, 0.0);
    }
}
