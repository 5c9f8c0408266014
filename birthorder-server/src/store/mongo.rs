//! Document submission store backed by MongoDB
//!
//! Documents use camelCase field names and an ObjectId `_id`. Statistics run
//! as an aggregation pipeline grouped by (region, gender) and are recombined
//! in process like the other backends.

use async_trait::async_trait;
use birthorder_core::{
    recombine, FieldLayout, GroupAggregate, NewSubmission, StatisticsOutcome, Submission,
};
use chrono::{SubsecRound, TimeZone, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, IndexModel};

use super::{Backend, Paginated, Pagination, StoreError, SubmissionStore};

/// Database used when the connection string does not name one
pub const DEFAULT_DATABASE: &str = "birth-order-research";

const COLLECTION: &str = "submissions";

pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect and make sure the collection indexes exist.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));
        tracing::info!(database = %database.name(), "connected to MongoDB");

        let store = Self {
            collection: database.collection::<Document>(COLLECTION),
            client,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let indexes = [
            doc! { "region": 1, "timestamp": -1 },
            doc! { "attitudeScore": 1 },
            doc! { "timestamp": -1 },
        ]
        .into_iter()
        .map(|keys| IndexModel::builder().keys(keys).build());

        self.collection.create_indexes(indexes).await?;
        tracing::debug!("submission indexes ready");
        Ok(())
    }

    fn newest_first() -> Document {
        doc! { "timestamp": -1, "_id": -1 }
    }

    async fn find(&self, filter: Document) -> Result<Vec<Submission>, StoreError> {
        let documents: Vec<Document> = self
            .collection
            .find(filter)
            .sort(Self::newest_first())
            .await?
            .try_collect()
            .await?;
        documents.iter().map(from_document).collect()
    }
}

fn optional_string(value: &Option<String>) -> Bson {
    match value {
        Some(s) => Bson::String(s.clone()),
        None => Bson::Null,
    }
}

fn to_document(id: ObjectId, submission: &Submission) -> Document {
    doc! {
        "_id": id,
        "region": submission.region.as_str(),
        "familySize": i32::from(submission.family_size),
        "firstbornGender": submission.firstborn_gender.as_str(),
        "attitudeScore": submission.attitude_score,
        "firstbornEducation": submission.firstborn_education,
        "laterbornEducation": submission.laterborn_education,
        "ageRange": submission.age_range.as_str(),
        "notes": submission.notes.as_str(),
        "contactEmail": submission.contact_email.as_str(),
        "ipAddress": optional_string(&submission.ip_address),
        "userAgent": optional_string(&submission.user_agent),
        "timestamp": BsonDateTime::from_millis(submission.timestamp.timestamp_millis()),
    }
}

/// Numeric field regardless of the BSON width it was stored with.
fn number(document: &Document, key: &str) -> Option<f64> {
    match document.get(key)? {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

fn from_document(document: &Document) -> Result<Submission, StoreError> {
    let id = document.get_object_id("_id")?.to_hex();
    let corrupt = |reason: String| StoreError::corrupt(id.clone(), reason);
    let required = |key: &str| {
        number(document, key).ok_or_else(|| corrupt(format!("{key} is not a number")))
    };

    let family_size = required("familySize")?;
    let millis = document.get_datetime("timestamp")?.timestamp_millis();

    Ok(Submission {
        region: document
            .get_str("region")?
            .parse()
            .map_err(|e| corrupt(format!("region: {e}")))?,
        family_size: u8::try_from(family_size as i64)
            .map_err(|_| corrupt(format!("familySize out of range: {family_size}")))?,
        firstborn_gender: document
            .get_str("firstbornGender")?
            .parse()
            .map_err(|e| corrupt(format!("firstbornGender: {e}")))?,
        attitude_score: required("attitudeScore")?,
        firstborn_education: required("firstbornEducation")?,
        laterborn_education: required("laterbornEducation")?,
        age_range: document
            .get_str("ageRange")?
            .parse()
            .map_err(|e| corrupt(format!("ageRange: {e}")))?,
        notes: document.get_str("notes").unwrap_or_default().to_owned(),
        contact_email: document.get_str("contactEmail").unwrap_or_default().to_owned(),
        ip_address: document.get_str("ipAddress").ok().map(str::to_owned),
        user_agent: document.get_str("userAgent").ok().map(str::to_owned),
        timestamp: Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| corrupt(format!("timestamp out of range: {millis}")))?,
        id: id.clone(),
    })
}

fn group_from_document(document: &Document) -> Result<GroupAggregate, StoreError> {
    let key = document.get_document("_id")?;
    let corrupt = |reason: String| StoreError::corrupt("group", reason);
    let required = |key: &str| {
        number(document, key).ok_or_else(|| corrupt(format!("{key} is not a number")))
    };

    Ok(GroupAggregate {
        region: key
            .get_str("region")?
            .parse()
            .map_err(|e| corrupt(format!("region: {e}")))?,
        gender: key
            .get_str("gender")?
            .parse()
            .map_err(|e| corrupt(format!("gender: {e}")))?,
        count: required("count")? as u64,
        mean_family_size: required("avgFamilySize")?,
        mean_attitude_score: required("avgAttitudeScore")?,
        mean_education_difference: required("avgEducationDiff")?,
    })
}

#[async_trait]
impl SubmissionStore for MongoStore {
    fn backend(&self) -> Backend {
        Backend::Mongodb
    }

    fn export_layout(&self) -> FieldLayout {
        FieldLayout::Document
    }

    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let id = ObjectId::new();
        // BSON dates carry milliseconds
        let stored = submission.into_stored(id.to_hex(), Utc::now().trunc_subsecs(3));
        self.collection.insert_one(to_document(id, &stored)).await?;
        tracing::debug!(id = %stored.id, "inserted submission document");
        Ok(stored)
    }

    async fn list(&self, page: Pagination) -> Result<Paginated<Submission>, StoreError> {
        let documents: Vec<Document> = self
            .collection
            .find(doc! {})
            .sort(Self::newest_first())
            .skip(page.offset())
            .limit(i64::from(page.limit))
            .await?
            .try_collect()
            .await?;

        Ok(Paginated {
            items: documents
                .iter()
                .map(from_document)
                .collect::<Result<_, _>>()?,
            total: self.count().await?,
            page: page.page,
            limit: page.limit,
        })
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Submission>, StoreError> {
        self.find(doc! { "region": region }).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn all(&self) -> Result<Vec<Submission>, StoreError> {
        self.find(doc! {}).await
    }

    async fn statistics(&self) -> Result<StatisticsOutcome, StoreError> {
        let pipeline = [doc! {
            "$group": {
                "_id": { "region": "$region", "gender": "$firstbornGender" },
                "count": { "$sum": 1 },
                "avgFamilySize": { "$avg": "$familySize" },
                "avgAttitudeScore": { "$avg": "$attitudeScore" },
                "avgEducationDiff": {
                    "$avg": { "$subtract": ["$firstbornEducation", "$laterbornEducation"] }
                },
            }
        }];

        let documents: Vec<Document> = self
            .collection
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;
        let groups = documents
            .iter()
            .map(group_from_document)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recombine(&groups))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
